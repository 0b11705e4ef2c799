use std::io::Write;

use crate::error::Result;
use crate::mesh::PolygonMesh;
use crate::primitives_builtin::Artifact;
use crate::spline_object::SplineObject;

/// Writes `mesh` as Wavefront OBJ. Corner UVs are written one `vt` per
/// polygon corner; triangles emit three corners.
pub fn write_obj<W: Write>(writer: &mut W, mesh: &PolygonMesh) -> Result<()> {
    for p in &mesh.points {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    let uvs = mesh
        .uvs
        .as_ref()
        .filter(|uvs| uvs.len() == mesh.polygon_count());
    if let Some(uvs) = uvs {
        for (poly, quad) in mesh.polygons.iter().zip(uvs) {
            let corners = if poly.is_triangle() { 3 } else { 4 };
            for uv in &quad[..corners] {
                writeln!(writer, "vt {} {}", uv.x, uv.y)?;
            }
        }
    }

    let mut next_uv = 1usize;
    for poly in &mesh.polygons {
        let corners = poly.corners();
        let corners = if poly.is_triangle() { &corners[..3] } else { &corners[..] };
        write!(writer, "f")?;
        for &index in corners {
            let v = index as usize + 1;
            if uvs.is_some() {
                write!(writer, " {v}/{next_uv}")?;
                next_uv += 1;
            } else {
                write!(writer, " {v}")?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Writes `spline` as OBJ points joined by a single `l` polyline.
pub fn write_spline_obj<W: Write>(writer: &mut W, spline: &SplineObject) -> Result<()> {
    for p in &spline.points {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    if spline.point_count() < 2 {
        return Ok(());
    }
    write!(writer, "l")?;
    for index in 1..=spline.point_count() {
        write!(writer, " {index}")?;
    }
    if spline.closed {
        write!(writer, " 1")?;
    }
    writeln!(writer)?;
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save_obj(path: impl AsRef<std::path::Path>, artifact: &Artifact) -> Result<()> {
    let path = path.as_ref();
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    match artifact {
        Artifact::Surface(mesh) => write_obj(&mut file, mesh)?,
        Artifact::Spline(spline) => write_spline_obj(&mut file, spline)?,
    }
    file.flush()?;
    tracing::info!("wrote {} points to {}", artifact.point_count(), path.display());
    Ok(())
}
