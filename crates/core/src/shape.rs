#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use glam::Vec3;

use crate::cache::DirtyCache;
use crate::context::{ArtifactKind, ArtifactUpdate, Generation, GenerationContext, RunStats};
use crate::error::{GenerationError, Result, SegmentAxis};
use crate::mesh::PolygonMesh;
use crate::object::PrimitiveObject;
use crate::param_spec::ParamSpec;
use crate::parallel::{fill_indexed, worker_count};
use crate::params::{ParamId, ParamValue, Params};
use crate::uv::{make_planar_uvs, quad_for_cell, Winding};

pub const USEGMENTS: ParamId = ParamId::new(9000);
pub const VSEGMENTS: ParamId = ParamId::new(9001);
pub const OPTIMIZE: ParamId = ParamId::new(9002);
pub const MULTITHREADING: ParamId = ParamId::new(9003);
pub const LASTRUN: ParamId = ParamId::new(9004);

/// Per-run description of a surface: grid size, parameter domain and the
/// flags that drive assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeInfo {
    pub u_segments: i32,
    pub v_segments: i32,
    pub u_min: f32,
    pub u_max: f32,
    pub v_min: f32,
    pub v_max: f32,
    pub u_delta: f32,
    pub v_delta: f32,
    pub optimize: bool,
    pub optimize_passes: u32,
    pub optimize_threshold: f32,
    pub multithreading: bool,
    pub inverse_normals: bool,
    pub watch_for_shading_tag: bool,
    pub generate_uv: bool,
    pub flip_uv_x: bool,
    pub flip_uv_y: bool,
    pub rotate_polygons: bool,
}

impl Default for ShapeInfo {
    fn default() -> Self {
        Self {
            u_segments: -1,
            v_segments: -1,
            u_min: 0.0,
            u_max: 0.0,
            v_min: 0.0,
            v_max: 0.0,
            u_delta: 0.0,
            v_delta: 0.0,
            optimize: true,
            optimize_passes: 1,
            optimize_threshold: 0.001,
            multithreading: true,
            inverse_normals: false,
            watch_for_shading_tag: true,
            generate_uv: true,
            flip_uv_x: false,
            flip_uv_y: false,
            rotate_polygons: false,
        }
    }
}

impl ShapeInfo {
    pub fn winding(&self) -> Winding {
        Winding::new(self.rotate_polygons, self.inverse_normals)
    }

    /// Domain coordinate of grid point `index`. Points are stored u-major
    /// with `v_segments + 1` points per row.
    pub fn domain_at(&self, index: usize) -> (f32, f32) {
        let row = self.v_segments.max(0) as usize + 1;
        let i = index / row;
        let j = index % row;
        (
            self.u_min + i as f32 * self.u_delta,
            self.v_min + j as f32 * self.v_delta,
        )
    }
}

pub fn base_shape_params() -> Params {
    Params::from_pairs([
        (USEGMENTS, ParamValue::Int(20)),
        (VSEGMENTS, ParamValue::Int(20)),
        (OPTIMIZE, ParamValue::Bool(false)),
        (MULTITHREADING, ParamValue::Bool(true)),
        (LASTRUN, ParamValue::String(String::new())),
    ])
}

pub fn base_shape_specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int_min(USEGMENTS, "U Segments", 1),
        ParamSpec::int_min(VSEGMENTS, "V Segments", 1),
        ParamSpec::bool(OPTIMIZE, "Optimize")
            .with_help("Weld coincident points after generation."),
        ParamSpec::bool(MULTITHREADING, "Multithreading"),
        ParamSpec::status(LASTRUN, "Last Run"),
    ]
}

/// Reads the shared surface parameters into `info`.
pub fn init_shape_info(params: &Params, info: &mut ShapeInfo) {
    info.u_segments = params.get_int(USEGMENTS, info.u_segments);
    info.v_segments = params.get_int(VSEGMENTS, info.v_segments);
    info.optimize = params.get_bool(OPTIMIZE, false);
    info.multithreading = params.get_bool(MULTITHREADING, info.multithreading);
    info.optimize_passes = 1;
}

/// A parametric surface `f(u, v) -> point` plus the hooks the generator
/// calls around point evaluation.
///
/// `calc_point` runs concurrently on worker threads; every other hook runs
/// on the calling thread. `Data` is created by `init_calculation` and
/// handed back to `free_calculation` on every path once init succeeded.
pub trait ComplexShape: Send + Sync {
    type Data: Send + Sync;

    fn init_calculation(&self, params: &Params, info: &mut ShapeInfo) -> std::result::Result<Self::Data, String>;

    fn init_thread_activity(
        &self,
        _params: &Params,
        _info: &ShapeInfo,
        _data: &mut Self::Data,
        _workers: usize,
    ) -> std::result::Result<(), String> {
        Ok(())
    }

    fn free_thread_activity(
        &self,
        _params: &Params,
        _info: &ShapeInfo,
        _data: &mut Self::Data,
        _workers: usize,
    ) {
    }

    fn calc_point(&self, _info: &ShapeInfo, _data: &Self::Data, _u: f32, _v: f32, _worker: usize) -> Vec3 {
        Vec3::ZERO
    }

    /// May edit, replace or clear the target. A cleared target aborts the run.
    fn post_process_calculation(
        &self,
        _params: &Params,
        _info: &mut ShapeInfo,
        _data: &mut Self::Data,
        _target: &mut Option<PolygonMesh>,
    ) {
    }

    fn free_calculation(&self, _params: &Params, _info: &mut ShapeInfo, _data: Self::Data) {}
}

/// Reads the shared parameters and nothing else; every point is the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseComplexShape;

impl ComplexShape for BaseComplexShape {
    type Data = ();

    fn init_calculation(&self, params: &Params, info: &mut ShapeInfo) -> std::result::Result<(), String> {
        init_shape_info(params, info);
        Ok(())
    }
}

/// Owns a surface evaluator and the cache that gates it.
pub struct ShapeGenerator<S: ComplexShape> {
    shape: S,
    cache: DirtyCache,
}

impl<S: ComplexShape> ShapeGenerator<S> {
    pub fn new(shape: S) -> Self {
        Self {
            shape,
            cache: DirtyCache::new(),
        }
    }

    pub fn shape(&self) -> &S {
        &self.shape
    }

    pub fn cache(&self) -> &DirtyCache {
        &self.cache
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Builds the mesh unless `change_count` matches the last successful
    /// run, in which case the caller keeps the mesh it already has.
    pub fn generate(
        &mut self,
        object: &PrimitiveObject,
        change_count: u64,
        ctx: &GenerationContext,
    ) -> Result<Generation<PolygonMesh>> {
        if !self.cache.check_and_update(change_count) {
            tracing::debug!("surface unchanged at change count {}", change_count);
            return Ok(Generation::Unchanged);
        }
        match build_shape(&self.shape, object, change_count, ctx) {
            Ok((artifact, stats)) => Ok(Generation::Generated { artifact, stats }),
            Err(err) => {
                self.cache.invalidate();
                tracing::error!("surface generation aborted: {}", err);
                Err(err)
            }
        }
    }
}

fn positive_segments(value: i32, axis: SegmentAxis) -> Result<u32> {
    if value <= 0 {
        return Err(GenerationError::InvalidSegments { axis, value });
    }
    Ok(value as u32)
}

/// Point and polygon counts of a `u` × `v` grid, if every index fits `u32`.
pub fn surface_counts(u_segments: u32, v_segments: u32) -> Option<(usize, usize)> {
    let rows = (u_segments as usize).checked_add(1)?;
    let cols = (v_segments as usize).checked_add(1)?;
    let points = rows.checked_mul(cols)?;
    let polygons = (u_segments as usize).checked_mul(v_segments as usize)?;
    if points - 1 > u32::MAX as usize {
        return None;
    }
    Some((points, polygons))
}

/// Runs one full surface generation without consulting a cache.
pub fn build_shape<S: ComplexShape>(
    shape: &S,
    object: &PrimitiveObject,
    change_count: u64,
    ctx: &GenerationContext,
) -> Result<(PolygonMesh, RunStats)> {
    let start = Instant::now();
    let params = object.params();
    let mut info = ShapeInfo::default();
    let mut data = shape
        .init_calculation(params, &mut info)
        .map_err(GenerationError::Configuration)?;

    let outcome = assemble(shape, object, ctx, &mut info, &mut data);
    shape.free_calculation(params, &mut info, data);
    let (mut mesh, mut stats) = outcome?;

    mesh.notify_updated();
    stats.duration_ms = start.elapsed().as_secs_f32() * 1000.0;
    stats.point_count = mesh.point_count();
    stats.polygon_count = mesh.polygon_count();
    ctx.notify(&ArtifactUpdate {
        kind: ArtifactKind::Surface,
        change_count,
        point_count: stats.point_count,
        polygon_count: stats.polygon_count,
        update_count: mesh.update_count(),
    });
    tracing::debug!(
        "surface built: {} points, {} polygons, {} workers, {:.2} ms",
        stats.point_count,
        stats.polygon_count,
        stats.worker_count,
        stats.duration_ms
    );
    Ok((mesh, stats))
}

fn assemble<S: ComplexShape>(
    shape: &S,
    object: &PrimitiveObject,
    ctx: &GenerationContext,
    info: &mut ShapeInfo,
    data: &mut S::Data,
) -> Result<(PolygonMesh, RunStats)> {
    let params = object.params();
    let u_segments = positive_segments(info.u_segments, SegmentAxis::U)?;
    let v_segments = positive_segments(info.v_segments, SegmentAxis::V)?;
    info.u_delta = (info.u_max - info.u_min) / u_segments as f32;
    info.v_delta = (info.v_max - info.v_min) / v_segments as f32;

    let (point_count, polygon_count) = surface_counts(u_segments, v_segments).ok_or_else(|| {
        GenerationError::Allocation(format!(
            "{u_segments} x {v_segments} segments exceed the index range"
        ))
    })?;
    if !ctx.threading.admits(point_count) {
        return Err(GenerationError::Allocation(format!(
            "{point_count} points exceed the budget of {}",
            ctx.threading.point_budget.unwrap_or_default()
        )));
    }
    let mut mesh = ctx
        .factory
        .allocate_surface(point_count, polygon_count)
        .ok_or_else(|| {
            GenerationError::Allocation(format!(
                "no mesh with {point_count} points and {polygon_count} polygons"
            ))
        })?;
    if mesh.point_count() != point_count || mesh.polygon_count() != polygon_count {
        return Err(GenerationError::Allocation(format!(
            "expected {} points and {} polygons, factory returned {} and {}",
            point_count,
            polygon_count,
            mesh.point_count(),
            mesh.polygon_count()
        )));
    }

    let threading = &ctx.threading;
    let workers = if info.multithreading {
        worker_count(
            point_count,
            threading.max_points_per_thread,
            threading.surface_reserve,
            threading.available(),
        )
    } else {
        1
    };
    shape
        .init_thread_activity(params, info, data, workers)
        .map_err(GenerationError::ThreadSetup)?;
    {
        let info: &ShapeInfo = info;
        let data: &S::Data = data;
        fill_indexed(&mut mesh.points, workers, threading.chunk_size, |index, worker| {
            let (u, v) = info.domain_at(index);
            shape.calc_point(info, data, u, v, worker)
        });
    }
    shape.free_thread_activity(params, info, data, workers);

    let winding = info.winding();
    for i in 0..u_segments {
        for j in 0..v_segments {
            let index = i as usize * v_segments as usize + j as usize;
            mesh.polygons[index] = quad_for_cell(i, j, v_segments, winding);
        }
    }
    if info.watch_for_shading_tag {
        mesh.shading = object.shading().copied();
    }
    if info.generate_uv {
        mesh.uvs = Some(make_planar_uvs(
            u_segments,
            v_segments,
            winding,
            info.flip_uv_x,
            info.flip_uv_y,
        ));
    }

    let mut optimize_failures = 0;
    if info.optimize {
        for pass in 0..info.optimize_passes {
            if !ctx.optimizer.optimize_mesh(&mut mesh, info.optimize_threshold) {
                tracing::warn!("optimize pass {} of {} failed", pass + 1, info.optimize_passes);
                optimize_failures += 1;
            }
        }
    }

    let mut target = Some(mesh);
    shape.post_process_calculation(params, info, data, &mut target);
    let mesh = target.ok_or(GenerationError::PostProcessInvalidated)?;

    Ok((
        mesh,
        RunStats {
            worker_count: workers,
            optimize_failures,
            ..RunStats::default()
        },
    ))
}
