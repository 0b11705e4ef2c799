use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let mut iter = points.iter();
        let first = iter.next()?;
        let mut min = *first;
        let mut max = *first;
        for p in iter {
            min = min.min(*p);
            max = max.max(*p);
        }
        Some(Self {
            min: min.to_array(),
            max: max.to_array(),
        })
    }

    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// A polygon with four point indices. Triangles repeat their third corner
/// (`c == d`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Polygon {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

impl Polygon {
    pub const fn quad(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self { a, b, c, d }
    }

    pub const fn triangle(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c, d: c }
    }

    pub fn is_triangle(&self) -> bool {
        self.c == self.d
    }

    pub fn corners(&self) -> [u32; 4] {
        [self.a, self.b, self.c, self.d]
    }

    pub fn from_corners(corners: [u32; 4]) -> Self {
        Self::quad(corners[0], corners[1], corners[2], corners[3])
    }

    /// Flips the winding. Triangles keep `c == d`.
    pub fn reversed(&self) -> Self {
        if self.is_triangle() {
            Self::triangle(self.c, self.b, self.a)
        } else {
            Self::quad(self.d, self.c, self.b, self.a)
        }
    }
}

/// Texture coordinates for the four corners of one polygon, in corner order.
pub type UvQuad = [Vec2; 4];

/// Reverses a corner UV set the same way [`Polygon::reversed`] reverses the
/// polygon it belongs to.
pub fn reverse_uv_quad(uv: &UvQuad, is_triangle: bool) -> UvQuad {
    if is_triangle {
        [uv[2], uv[1], uv[0], uv[0]]
    } else {
        [uv[3], uv[2], uv[1], uv[0]]
    }
}

/// Smoothing settings carried from the source object onto generated meshes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadingTag {
    pub limit_angle: bool,
    /// Radians.
    pub smoothing_angle: f32,
}

impl Default for ShadingTag {
    fn default() -> Self {
        Self {
            limit_angle: true,
            smoothing_angle: 80f32.to_radians(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PolygonMesh {
    pub points: Vec<Vec3>,
    pub polygons: Vec<Polygon>,
    pub uvs: Option<Vec<UvQuad>>,
    pub shading: Option<ShadingTag>,
    update_count: u64,
    bounds: Option<Aabb>,
}

impl PolygonMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mesh with `point_count` origin points and `polygon_count` empty
    /// polygons, ready to be filled in place.
    pub fn with_counts(point_count: usize, polygon_count: usize) -> Self {
        Self {
            points: vec![Vec3::ZERO; point_count],
            polygons: vec![Polygon::default(); polygon_count],
            ..Self::default()
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.polygons.iter().filter(|poly| poly.is_triangle()).count()
    }

    /// Reverses polygon `index` and its corner UVs, if present.
    pub fn reverse_polygon(&mut self, index: usize) {
        let Some(poly) = self.polygons.get_mut(index) else {
            return;
        };
        let is_triangle = poly.is_triangle();
        *poly = poly.reversed();
        if let Some(uv) = self.uvs.as_mut().and_then(|uvs| uvs.get_mut(index)) {
            *uv = reverse_uv_quad(uv, is_triangle);
        }
    }

    /// Marks the mesh as changed: refreshes the cached bounds and bumps the
    /// update counter.
    pub fn notify_updated(&mut self) {
        self.bounds = Aabb::from_points(&self.points);
        self.update_count += 1;
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Bounds as of the last [`Self::notify_updated`].
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    pub fn has_valid_indices(&self) -> bool {
        let count = self.points.len() as u64;
        self.polygons
            .iter()
            .all(|poly| poly.corners().iter().all(|idx| u64::from(*idx) < count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_refresh_on_notify() {
        let mut mesh = PolygonMesh::with_counts(2, 0);
        mesh.points[0] = Vec3::new(1.0, -2.0, 0.5);
        mesh.points[1] = Vec3::new(-3.0, 4.0, 2.0);
        assert!(mesh.bounds().is_none());
        mesh.notify_updated();
        let bounds = mesh.bounds().expect("bounds");
        assert_eq!(bounds.min, [-3.0, -2.0, 0.5]);
        assert_eq!(bounds.max, [1.0, 4.0, 2.0]);
        assert_eq!(mesh.update_count(), 1);
    }

    #[test]
    fn reversing_keeps_triangles_triangles() {
        let quad = Polygon::quad(0, 1, 2, 3);
        assert_eq!(quad.reversed(), Polygon::quad(3, 2, 1, 0));
        let tri = Polygon::triangle(4, 5, 6);
        assert_eq!(tri.reversed(), Polygon::triangle(6, 5, 4));
        assert!(tri.reversed().is_triangle());
    }

    #[test]
    fn reverse_polygon_moves_uvs_with_corners() {
        let mut mesh = PolygonMesh::with_counts(4, 1);
        mesh.polygons[0] = Polygon::quad(0, 1, 2, 3);
        let uv = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ];
        mesh.uvs = Some(vec![uv]);
        mesh.reverse_polygon(0);
        assert_eq!(mesh.polygons[0], Polygon::quad(3, 2, 1, 0));
        assert_eq!(mesh.uvs.as_ref().unwrap()[0], [uv[3], uv[2], uv[1], uv[0]]);
    }

    #[test]
    fn index_validation() {
        let mut mesh = PolygonMesh::with_counts(3, 1);
        mesh.polygons[0] = Polygon::triangle(0, 1, 2);
        assert!(mesh.has_valid_indices());
        mesh.polygons[0] = Polygon::triangle(0, 1, 3);
        assert!(!mesh.has_valid_indices());
    }
}
