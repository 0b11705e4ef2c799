#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use glam::Vec3;

use crate::cache::DirtyCache;
use crate::context::{ArtifactKind, ArtifactUpdate, Generation, GenerationContext, RunStats};
use crate::error::{GenerationError, Result, SegmentAxis};
use crate::object::PrimitiveObject;
use crate::param_spec::ParamSpec;
use crate::parallel::{fill_indexed, worker_count};
use crate::params::{ParamId, ParamValue, Params};
use crate::spline_object::{InterpolationSettings, SplineInterpolation, SplineObject, SplineType};

pub const SEGMENTS: ParamId = ParamId::new(8000);
pub const OPTIMIZE: ParamId = ParamId::new(8001);
pub const LASTRUN: ParamId = ParamId::new(8002);
pub const INTERPOLATION: ParamId = ParamId::new(8010);
pub const SUB: ParamId = ParamId::new(8011);
pub const ANGLE: ParamId = ParamId::new(8012);
pub const MAXIMUMLENGTH: ParamId = ParamId::new(8013);

#[derive(Debug, Clone, PartialEq)]
pub struct SplineInfo {
    pub segments: i32,
    pub min: f32,
    pub max: f32,
    pub delta: f32,
    pub spline_type: SplineType,
    pub closed: bool,
    pub optimize: bool,
    pub optimize_threshold: f32,
    pub multithreading: bool,
}

impl Default for SplineInfo {
    fn default() -> Self {
        Self {
            segments: -1,
            min: 0.0,
            max: 0.0,
            delta: 0.0,
            spline_type: SplineType::BSpline,
            closed: true,
            optimize: false,
            optimize_threshold: 0.01,
            multithreading: false,
        }
    }
}

impl SplineInfo {
    pub fn domain_at(&self, index: usize) -> f32 {
        self.min + index as f32 * self.delta
    }
}

pub fn base_spline_params() -> Params {
    let settings = InterpolationSettings::default();
    Params::from_pairs([
        (SEGMENTS, ParamValue::Int(40)),
        (OPTIMIZE, ParamValue::Bool(false)),
        (LASTRUN, ParamValue::String(String::new())),
        (INTERPOLATION, ParamValue::Int(settings.interpolation.index())),
        (SUB, ParamValue::Int(settings.sub)),
        (ANGLE, ParamValue::Float(settings.angle)),
        (MAXIMUMLENGTH, ParamValue::Float(settings.max_length)),
    ])
}

pub fn base_spline_specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int_min(SEGMENTS, "Segments", 1),
        ParamSpec::bool(OPTIMIZE, "Optimize"),
        ParamSpec::status(LASTRUN, "Last Run"),
        ParamSpec::int_enum(INTERPOLATION, "Intermediate Points", SplineInterpolation::OPTIONS.to_vec()),
        ParamSpec::int_min(SUB, "Number", 0),
        ParamSpec::float_range(ANGLE, "Angle", 0.0, std::f32::consts::PI),
        ParamSpec::float_min(MAXIMUMLENGTH, "Maximum Length", 0.0),
    ]
}

pub fn init_spline_info(params: &Params, info: &mut SplineInfo) {
    info.segments = params.get_int(SEGMENTS, info.segments);
    info.optimize = params.get_bool(OPTIMIZE, false);
}

/// Copies the closed flag and the interpolation settings onto the target.
pub fn apply_spline_settings(params: &Params, info: &SplineInfo, target: &mut Option<SplineObject>) {
    let Some(spline) = target.as_mut() else {
        return;
    };
    let defaults = InterpolationSettings::default();
    spline.closed = info.closed;
    spline.settings = InterpolationSettings {
        interpolation: SplineInterpolation::from_index(
            params.get_int(INTERPOLATION, defaults.interpolation.index()),
        )
        .unwrap_or(defaults.interpolation),
        sub: params.get_int(SUB, defaults.sub),
        angle: params.get_float(ANGLE, defaults.angle),
        max_length: params.get_float(MAXIMUMLENGTH, defaults.max_length),
    };
}

/// A parametric curve `f(u) -> point`. Hook order and threading follow
/// [`crate::ComplexShape`].
pub trait ComplexSpline: Send + Sync {
    type Data: Send + Sync;

    fn init_calculation(&self, params: &Params, info: &mut SplineInfo) -> std::result::Result<Self::Data, String>;

    fn init_thread_activity(
        &self,
        _params: &Params,
        _info: &SplineInfo,
        _data: &mut Self::Data,
        _workers: usize,
    ) -> std::result::Result<(), String> {
        Ok(())
    }

    fn free_thread_activity(
        &self,
        _params: &Params,
        _info: &SplineInfo,
        _data: &mut Self::Data,
        _workers: usize,
    ) {
    }

    fn calc_point(&self, _info: &SplineInfo, _data: &Self::Data, _u: f32, _worker: usize) -> Vec3 {
        Vec3::ZERO
    }

    fn post_process_calculation(
        &self,
        params: &Params,
        info: &mut SplineInfo,
        _data: &mut Self::Data,
        target: &mut Option<SplineObject>,
    ) {
        apply_spline_settings(params, info, target);
    }

    fn free_calculation(&self, _params: &Params, _info: &mut SplineInfo, _data: Self::Data) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BaseComplexSpline;

impl ComplexSpline for BaseComplexSpline {
    type Data = ();

    fn init_calculation(&self, params: &Params, info: &mut SplineInfo) -> std::result::Result<(), String> {
        init_spline_info(params, info);
        Ok(())
    }
}

pub struct SplineGenerator<S: ComplexSpline> {
    spline: S,
    cache: DirtyCache,
}

impl<S: ComplexSpline> SplineGenerator<S> {
    pub fn new(spline: S) -> Self {
        Self {
            spline,
            cache: DirtyCache::new(),
        }
    }

    pub fn spline(&self) -> &S {
        &self.spline
    }

    pub fn cache(&self) -> &DirtyCache {
        &self.cache
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    pub fn generate(
        &mut self,
        object: &PrimitiveObject,
        change_count: u64,
        ctx: &GenerationContext,
    ) -> Result<Generation<SplineObject>> {
        if !self.cache.check_and_update(change_count) {
            tracing::debug!("spline unchanged at change count {}", change_count);
            return Ok(Generation::Unchanged);
        }
        match build_spline(&self.spline, object, change_count, ctx) {
            Ok((artifact, stats)) => Ok(Generation::Generated { artifact, stats }),
            Err(err) => {
                self.cache.invalidate();
                tracing::error!("spline generation aborted: {}", err);
                Err(err)
            }
        }
    }
}

pub fn build_spline<S: ComplexSpline>(
    spline: &S,
    object: &PrimitiveObject,
    change_count: u64,
    ctx: &GenerationContext,
) -> Result<(SplineObject, RunStats)> {
    let start = Instant::now();
    let params = object.params();
    let mut info = SplineInfo::default();
    let mut data = spline
        .init_calculation(params, &mut info)
        .map_err(GenerationError::Configuration)?;

    let outcome = assemble(spline, params, ctx, &mut info, &mut data);
    spline.free_calculation(params, &mut info, data);
    let (mut target, mut stats) = outcome?;

    target.notify_updated();
    stats.duration_ms = start.elapsed().as_secs_f32() * 1000.0;
    stats.point_count = target.point_count();
    ctx.notify(&ArtifactUpdate {
        kind: ArtifactKind::Spline,
        change_count,
        point_count: stats.point_count,
        polygon_count: 0,
        update_count: target.update_count(),
    });
    tracing::debug!(
        "spline built: {} points, {} workers, {:.2} ms",
        stats.point_count,
        stats.worker_count,
        stats.duration_ms
    );
    Ok((target, stats))
}

fn assemble<S: ComplexSpline>(
    spline: &S,
    params: &Params,
    ctx: &GenerationContext,
    info: &mut SplineInfo,
    data: &mut S::Data,
) -> Result<(SplineObject, RunStats)> {
    if info.segments <= 0 {
        return Err(GenerationError::InvalidSegments {
            axis: SegmentAxis::Curve,
            value: info.segments,
        });
    }
    let point_count = info.segments as usize;
    info.delta = (info.max - info.min) / info.segments as f32;
    if !ctx.threading.admits(point_count) {
        return Err(GenerationError::Allocation(format!(
            "{point_count} spline points exceed the budget of {}",
            ctx.threading.point_budget.unwrap_or_default()
        )));
    }

    let mut target = ctx
        .factory
        .allocate_spline(point_count, info.spline_type)
        .ok_or_else(|| GenerationError::Allocation(format!("no spline with {point_count} points")))?;
    if target.point_count() != point_count {
        return Err(GenerationError::Allocation(format!(
            "expected {} spline points, factory returned {}",
            point_count,
            target.point_count()
        )));
    }
    target.closed = info.closed;

    let threading = &ctx.threading;
    let workers = if info.multithreading {
        worker_count(
            point_count,
            threading.max_points_per_thread,
            threading.spline_reserve,
            threading.available(),
        )
    } else {
        1
    };
    spline
        .init_thread_activity(params, info, data, workers)
        .map_err(GenerationError::ThreadSetup)?;
    {
        let info: &SplineInfo = info;
        let data: &S::Data = data;
        fill_indexed(&mut target.points, workers, threading.chunk_size, |index, worker| {
            spline.calc_point(info, data, info.domain_at(index), worker)
        });
    }
    spline.free_thread_activity(params, info, data, workers);

    let mut optimize_failures = 0;
    if info.optimize && !ctx.optimizer.optimize_spline(&mut target, info.optimize_threshold) {
        tracing::warn!("spline optimize failed");
        optimize_failures += 1;
    }

    let mut target = Some(target);
    spline.post_process_calculation(params, info, data, &mut target);
    let target = target.ok_or(GenerationError::PostProcessInvalidated)?;

    Ok((
        target,
        RunStats {
            worker_count: workers,
            optimize_failures,
            ..RunStats::default()
        },
    ))
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::context::{ArtifactFactory, HeapFactory, ThreadingConfig};
    use crate::mesh::PolygonMesh;

    struct Circle {
        tweak: fn(&mut SplineInfo),
        clear_target: bool,
        frees: AtomicUsize,
    }

    impl Circle {
        fn with(tweak: fn(&mut SplineInfo)) -> Self {
            Self {
                tweak,
                clear_target: false,
                frees: AtomicUsize::new(0),
            }
        }
    }

    impl ComplexSpline for Circle {
        type Data = f32;

        fn init_calculation(&self, params: &Params, info: &mut SplineInfo) -> std::result::Result<f32, String> {
            init_spline_info(params, info);
            info.max = TAU;
            (self.tweak)(info);
            Ok(10.0)
        }

        fn calc_point(&self, _info: &SplineInfo, radius: &f32, u: f32, _worker: usize) -> Vec3 {
            Vec3::new(u, u.cos() * radius, u.sin() * radius)
        }

        fn post_process_calculation(
            &self,
            params: &Params,
            info: &mut SplineInfo,
            _data: &mut f32,
            target: &mut Option<SplineObject>,
        ) {
            apply_spline_settings(params, info, target);
            if self.clear_target {
                *target = None;
            }
        }

        fn free_calculation(&self, _params: &Params, _info: &mut SplineInfo, _data: f32) {
            self.frees.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct RecordingFactory {
        splines: Mutex<Vec<usize>>,
    }

    impl ArtifactFactory for RecordingFactory {
        fn allocate_surface(&self, point_count: usize, polygon_count: usize) -> Option<PolygonMesh> {
            HeapFactory.allocate_surface(point_count, polygon_count)
        }

        fn allocate_spline(&self, point_count: usize, spline_type: SplineType) -> Option<SplineObject> {
            self.splines.lock().unwrap().push(point_count);
            HeapFactory.allocate_spline(point_count, spline_type)
        }
    }

    fn object(segments: i32) -> PrimitiveObject {
        let mut params = base_spline_params();
        params.set(SEGMENTS, ParamValue::Int(segments));
        PrimitiveObject::new(params, base_spline_specs())
    }

    fn generated(result: Result<Generation<SplineObject>>) -> (SplineObject, RunStats) {
        match result.expect("generation") {
            Generation::Generated { artifact, stats } => (artifact, stats),
            Generation::Unchanged => panic!("expected a fresh spline"),
        }
    }

    #[test]
    fn forty_segments_sample_the_open_domain() {
        let mut generator = SplineGenerator::new(Circle::with(|_| {}));
        let (spline, stats) = generated(generator.generate(&object(40), 1, &GenerationContext::new()));
        let delta = TAU / 40.0;
        assert_eq!(spline.point_count(), 40);
        assert_eq!(stats.worker_count, 1);
        for (i, point) in spline.points.iter().enumerate() {
            assert_eq!(point.x, i as f32 * delta);
        }
        assert!(spline.points[39].x < TAU);
        assert!(spline.closed);
        assert_eq!(spline.spline_type, SplineType::BSpline);
    }

    #[test]
    fn zero_segments_abort_before_allocation() {
        let factory = Arc::new(RecordingFactory::default());
        let ctx = GenerationContext::new().with_factory(factory.clone());
        let mut generator = SplineGenerator::new(Circle::with(|_| {}));
        let err = generator.generate(&object(0), 1, &ctx).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::InvalidSegments { axis: SegmentAxis::Curve, value: 0 }
        ));
        assert!(factory.splines.lock().unwrap().is_empty());
        assert_eq!(generator.spline().frees.load(Ordering::SeqCst), 1);
        assert!(!generator.cache().is_computed());
    }

    #[test]
    fn point_budget_rejects_long_splines() {
        let factory = Arc::new(RecordingFactory::default());
        let ctx = GenerationContext::new()
            .with_factory(factory.clone())
            .with_threading(ThreadingConfig {
                point_budget: Some(10),
                ..ThreadingConfig::default()
            });
        let mut generator = SplineGenerator::new(Circle::with(|_| {}));
        let err = generator.generate(&object(11), 1, &ctx).unwrap_err();
        assert!(matches!(err, GenerationError::Allocation(_)));
        assert!(factory.splines.lock().unwrap().is_empty());
        assert_eq!(generator.spline().frees.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn display_settings_are_copied_onto_the_spline() {
        let mut object = object(12);
        object
            .set_param(INTERPOLATION, ParamValue::Int(SplineInterpolation::Uniform.index()))
            .unwrap();
        object.set_param(SUB, ParamValue::Int(3)).unwrap();
        let mut generator = SplineGenerator::new(Circle::with(|info| {
            info.closed = false;
            info.spline_type = SplineType::Linear;
        }));
        let (spline, _) = generated(generator.generate(&object, 1, &GenerationContext::new()));
        assert!(!spline.closed);
        assert_eq!(spline.spline_type, SplineType::Linear);
        assert_eq!(spline.settings.interpolation, SplineInterpolation::Uniform);
        assert_eq!(spline.settings.sub, 3);
        assert_eq!(spline.settings.max_length, 5.0);
    }

    #[test]
    fn cache_gates_repeated_requests() {
        let mut generator = SplineGenerator::new(Circle::with(|_| {}));
        let ctx = GenerationContext::new();
        let object = object(8);
        assert!(!generator.generate(&object, 3, &ctx).unwrap().is_unchanged());
        assert!(generator.generate(&object, 3, &ctx).unwrap().is_unchanged());
        assert!(!generator.generate(&object, 4, &ctx).unwrap().is_unchanged());
    }

    #[test]
    fn cleared_target_aborts() {
        let mut circle = Circle::with(|_| {});
        circle.clear_target = true;
        let mut generator = SplineGenerator::new(circle);
        let err = generator
            .generate(&object(8), 1, &GenerationContext::new())
            .unwrap_err();
        assert!(matches!(err, GenerationError::PostProcessInvalidated));
        assert_eq!(generator.spline().frees.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn multithreaded_spline_matches_serial() {
        let ctx = GenerationContext::new().with_threading(ThreadingConfig {
            max_points_per_thread: 1000,
            chunk_size: 333,
            parallelism: Some(4),
            ..ThreadingConfig::default()
        });
        let mut serial = SplineGenerator::new(Circle::with(|_| {}));
        let (serial_spline, _) = generated(serial.generate(&object(10_000), 1, &ctx));
        let mut parallel = SplineGenerator::new(Circle::with(|info| info.multithreading = true));
        let (parallel_spline, stats) = generated(parallel.generate(&object(10_000), 1, &ctx));
        assert_eq!(stats.worker_count, 4);
        assert_eq!(serial_spline.points, parallel_spline.points);
    }

    #[test]
    fn optimize_merges_coincident_points() {
        let mut object = object(5);
        object.set_param(OPTIMIZE, ParamValue::Bool(true)).unwrap();
        let mut generator = SplineGenerator::new(BaseComplexSpline);
        let (spline, stats) = generated(generator.generate(&object, 1, &GenerationContext::new()));
        assert_eq!(stats.optimize_failures, 0);
        assert_eq!(spline.point_count(), 1);
    }

    #[test]
    fn base_spline_is_all_origin() {
        let mut generator = SplineGenerator::new(BaseComplexSpline);
        let (spline, _) = generated(generator.generate(&object(5), 1, &GenerationContext::new()));
        assert_eq!(spline.point_count(), 5);
        assert!(spline.points.iter().all(|p| *p == Vec3::ZERO));
        assert_eq!(spline.settings, InterpolationSettings::default());
    }
}
