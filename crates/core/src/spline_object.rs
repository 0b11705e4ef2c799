use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mesh::Aabb;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplineType {
    Linear,
    Cubic,
    Akima,
    #[default]
    BSpline,
    Bezier,
}

/// How a consumer subdivides the spline between its control points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplineInterpolation {
    None,
    Natural,
    Uniform,
    #[default]
    Adaptive,
    Subdivided,
}

impl SplineInterpolation {
    pub const OPTIONS: [(i32, &'static str); 5] = [
        (0, "None"),
        (1, "Natural"),
        (2, "Uniform"),
        (3, "Adaptive"),
        (4, "Subdivided"),
    ];

    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::None),
            1 => Some(Self::Natural),
            2 => Some(Self::Uniform),
            3 => Some(Self::Adaptive),
            4 => Some(Self::Subdivided),
            _ => None,
        }
    }

    pub fn index(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Natural => 1,
            Self::Uniform => 2,
            Self::Adaptive => 3,
            Self::Subdivided => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolationSettings {
    pub interpolation: SplineInterpolation,
    pub sub: i32,
    /// Radians.
    pub angle: f32,
    pub max_length: f32,
}

impl Default for InterpolationSettings {
    fn default() -> Self {
        Self {
            interpolation: SplineInterpolation::Adaptive,
            sub: 8,
            angle: 5f32.to_radians(),
            max_length: 5.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SplineObject {
    pub points: Vec<Vec3>,
    pub spline_type: SplineType,
    pub closed: bool,
    pub settings: InterpolationSettings,
    update_count: u64,
    bounds: Option<Aabb>,
}

impl SplineObject {
    pub fn with_points(point_count: usize, spline_type: SplineType) -> Self {
        Self {
            points: vec![Vec3::ZERO; point_count],
            spline_type,
            ..Self::default()
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of line segments between consecutive points, including the
    /// closing one.
    pub fn segment_count(&self) -> usize {
        if self.points.len() < 2 {
            0
        } else if self.closed {
            self.points.len()
        } else {
            self.points.len() - 1
        }
    }

    pub fn length(&self) -> f32 {
        let open: f32 = self
            .points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) if self.points.len() > 1 => {
                open + last.distance(*first)
            }
            _ => open,
        }
    }

    pub fn notify_updated(&mut self) {
        self.bounds = Aabb::from_points(&self.points);
        self.update_count += 1;
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }
}
