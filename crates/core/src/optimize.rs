use std::collections::HashMap;

use glam::Vec3;

use crate::mesh::{Polygon, PolygonMesh};
use crate::spline_object::SplineObject;

/// Post-generation cleanup applied to fresh artifacts. Returning `false`
/// reports that the pass failed; the artifact is still usable.
pub trait Optimizer: Send + Sync {
    fn optimize_mesh(&self, mesh: &mut PolygonMesh, threshold: f32) -> bool;
    fn optimize_spline(&self, spline: &mut SplineObject, threshold: f32) -> bool;
}

/// Merges points closer than the threshold, collapses the polygons that
/// lose corners and drops points no polygon references.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeldOptimizer;

impl Optimizer for WeldOptimizer {
    fn optimize_mesh(&self, mesh: &mut PolygonMesh, threshold: f32) -> bool {
        weld_mesh(mesh, threshold)
    }

    fn optimize_spline(&self, spline: &mut SplineObject, threshold: f32) -> bool {
        weld_spline(spline, threshold)
    }
}

fn valid_threshold(threshold: f32) -> bool {
    threshold.is_finite() && threshold >= 0.0
}

#[derive(Clone)]
struct Cluster {
    sum: Vec3,
    count: u32,
}

impl Cluster {
    fn center(&self) -> Vec3 {
        self.sum / self.count as f32
    }
}

/// Groups points within `radius` of a running cluster center. Returns the
/// cluster centers in first-seen order and the cluster of every input point.
fn cluster_points(points: &[Vec3], radius: f32) -> (Vec<Vec3>, Vec<u32>) {
    let inv_cell = 1.0 / radius.max(1.0e-6);
    let limit = radius * radius;
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut cell_map: HashMap<(i32, i32, i32), Vec<usize>> = HashMap::new();
    let mut mapping = vec![0u32; points.len()];

    for (idx, p) in points.iter().enumerate() {
        let cell = (
            (p.x * inv_cell).floor() as i32,
            (p.y * inv_cell).floor() as i32,
            (p.z * inv_cell).floor() as i32,
        );
        let mut best_cluster = None;
        let mut best_dist = limit;
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let key = (cell.0 + dx, cell.1 + dy, cell.2 + dz);
                    let Some(list) = cell_map.get(&key) else {
                        continue;
                    };
                    for &cluster_idx in list {
                        let dist = (*p - clusters[cluster_idx].center()).length_squared();
                        if dist <= best_dist {
                            best_dist = dist;
                            best_cluster = Some(cluster_idx);
                        }
                    }
                }
            }
        }

        let cluster_idx = match best_cluster {
            Some(cluster_idx) => {
                let cluster = &mut clusters[cluster_idx];
                cluster.sum += *p;
                cluster.count += 1;
                cluster_idx
            }
            None => {
                clusters.push(Cluster { sum: *p, count: 1 });
                cell_map.entry(cell).or_default().push(clusters.len() - 1);
                clusters.len() - 1
            }
        };
        mapping[idx] = cluster_idx as u32;
    }

    (clusters.iter().map(Cluster::center).collect(), mapping)
}

/// Drops consecutive repeated corners. Returns the surviving corners and
/// the slots they came from, or `None` if fewer than three remain.
fn collapse_corners(corners: [u32; 4]) -> Option<([u32; 4], [usize; 4])> {
    let mut slots = [0usize; 4];
    let mut len = 0;
    for k in 0..4 {
        if corners[k] != corners[(k + 3) % 4] {
            slots[len] = k;
            len += 1;
        }
    }
    match len {
        4 => Some((corners, [0, 1, 2, 3])),
        3 => {
            let kept = [slots[0], slots[1], slots[2], slots[2]];
            Some((kept.map(|slot| corners[slot]), kept))
        }
        _ => None,
    }
}

pub fn weld_mesh(mesh: &mut PolygonMesh, threshold: f32) -> bool {
    if mesh.points.is_empty() || !valid_threshold(threshold) {
        return false;
    }
    if mesh
        .uvs
        .as_ref()
        .is_some_and(|uvs| uvs.len() != mesh.polygons.len())
    {
        mesh.uvs = None;
    }

    let (centers, mapping) = cluster_points(&mesh.points, threshold);
    let mut polygons = Vec::with_capacity(mesh.polygons.len());
    let mut uvs = mesh.uvs.as_ref().map(|uvs| Vec::with_capacity(uvs.len()));

    for (index, poly) in mesh.polygons.iter().enumerate() {
        let corners = poly
            .corners()
            .map(|idx| mapping.get(idx as usize).copied().unwrap_or(0));
        let Some((corners, slots)) = collapse_corners(corners) else {
            continue;
        };
        polygons.push(Polygon::from_corners(corners));
        if let (Some(out), Some(source)) = (uvs.as_mut(), mesh.uvs.as_ref()) {
            let uv = source[index];
            out.push(slots.map(|slot| uv[slot]));
        }
    }

    let mut used = vec![false; centers.len()];
    for poly in &polygons {
        for corner in poly.corners() {
            used[corner as usize] = true;
        }
    }
    let mut remap = vec![0u32; centers.len()];
    let mut points = Vec::with_capacity(centers.len());
    for (slot, center) in centers.iter().enumerate() {
        if used[slot] {
            remap[slot] = points.len() as u32;
            points.push(*center);
        }
    }
    for poly in &mut polygons {
        *poly = Polygon::from_corners(poly.corners().map(|corner| remap[corner as usize]));
    }

    tracing::debug!(
        "weld: {} -> {} points, {} -> {} polygons",
        mesh.points.len(),
        points.len(),
        mesh.polygons.len(),
        polygons.len()
    );
    mesh.points = points;
    mesh.polygons = polygons;
    mesh.uvs = uvs;
    true
}

pub fn weld_spline(spline: &mut SplineObject, threshold: f32) -> bool {
    if spline.points.is_empty() || !valid_threshold(threshold) {
        return false;
    }
    let limit = threshold * threshold;
    let mut points: Vec<Vec3> = Vec::with_capacity(spline.points.len());
    for p in &spline.points {
        match points.last() {
            Some(last) if last.distance_squared(*p) <= limit => {}
            _ => points.push(*p),
        }
    }
    if spline.closed {
        while points.len() > 1 && points[0].distance_squared(points[points.len() - 1]) <= limit {
            points.pop();
        }
    }
    spline.points = points;
    true
}
