use glam::Vec2;

use crate::mesh::{Polygon, UvQuad};

/// Corner order of a grid cell's polygon. Cell corners are numbered
/// `p1 = (i, j)`, `p2 = (i, j + 1)`, `p3 = (i + 1, j + 1)`, `p4 = (i + 1, j)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Winding {
    pub rotate: bool,
    pub inverse: bool,
}

impl Winding {
    pub fn new(rotate: bool, inverse: bool) -> Self {
        Self { rotate, inverse }
    }

    /// Positions into `[p1, p2, p3, p4]` for polygon corners `a, b, c, d`.
    pub fn order(self) -> [usize; 4] {
        match (self.rotate, self.inverse) {
            (false, false) => [0, 1, 2, 3],
            (false, true) => [3, 2, 1, 0],
            (true, false) => [1, 2, 3, 0],
            (true, true) => [0, 3, 2, 1],
        }
    }

    pub fn apply<T: Copy>(self, corners: [T; 4]) -> [T; 4] {
        self.order().map(|slot| corners[slot])
    }
}

/// Point indices `[p1, p2, p3, p4]` of cell `(i, j)` in a grid with
/// `v_segments + 1` points per u-row.
pub fn cell_corners(i: u32, j: u32, v_segments: u32) -> [u32; 4] {
    let row = v_segments + 1;
    let p1 = i * row + j;
    let p3 = (i + 1) * row + j + 1;
    [p1, p1 + 1, p3, p3 - 1]
}

pub fn quad_for_cell(i: u32, j: u32, v_segments: u32, winding: Winding) -> Polygon {
    Polygon::from_corners(winding.apply(cell_corners(i, j, v_segments)))
}

/// Planar texture coordinates of cell `(i, j)`, permuted like its polygon
/// and flipped per axis.
pub fn uv_quad_for_cell(
    i: u32,
    j: u32,
    u_segments: u32,
    v_segments: u32,
    winding: Winding,
    flip_x: bool,
    flip_y: bool,
) -> UvQuad {
    let u = u_segments as f32;
    let v = v_segments as f32;
    let x0 = i as f32 / u;
    let x1 = (i + 1) as f32 / u;
    let y0 = j as f32 / v;
    let y1 = (j + 1) as f32 / v;
    let corners = [
        Vec2::new(x0, y0),
        Vec2::new(x0, y1),
        Vec2::new(x1, y1),
        Vec2::new(x1, y0),
    ];
    winding.apply(corners).map(|mut uv| {
        if flip_x {
            uv.x = 1.0 - uv.x;
        }
        if flip_y {
            uv.y = 1.0 - uv.y;
        }
        uv
    })
}

/// UVs for every cell of a `u_segments` × `v_segments` grid, in polygon order.
pub fn make_planar_uvs(
    u_segments: u32,
    v_segments: u32,
    winding: Winding,
    flip_x: bool,
    flip_y: bool,
) -> Vec<UvQuad> {
    let mut uvs = Vec::with_capacity(u_segments as usize * v_segments as usize);
    for i in 0..u_segments {
        for j in 0..v_segments {
            uvs.push(uv_quad_for_cell(
                i, j, u_segments, v_segments, winding, flip_x, flip_y,
            ));
        }
    }
    uvs
}
