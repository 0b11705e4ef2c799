use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::mesh::PolygonMesh;
use crate::optimize::{Optimizer, WeldOptimizer};
use crate::parallel::{available_parallelism, CHUNK_SIZE, MAX_POINTS_PER_THREAD};
use crate::spline_object::{SplineObject, SplineType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Surface,
    Spline,
}

/// Emitted once per successful generation, after the artifact was finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactUpdate {
    pub kind: ArtifactKind,
    pub change_count: u64,
    pub point_count: usize,
    pub polygon_count: usize,
    pub update_count: u64,
}

pub type UpdateSink = Arc<dyn Fn(&ArtifactUpdate) + Send + Sync>;

/// Creates empty artifacts of the requested size. `None` means the
/// allocation failed.
pub trait ArtifactFactory: Send + Sync {
    fn allocate_surface(&self, point_count: usize, polygon_count: usize) -> Option<PolygonMesh>;
    fn allocate_spline(&self, point_count: usize, spline_type: SplineType) -> Option<SplineObject>;
}

/// Allocates on the heap, reporting failure instead of aborting.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapFactory;

impl ArtifactFactory for HeapFactory {
    fn allocate_surface(&self, point_count: usize, polygon_count: usize) -> Option<PolygonMesh> {
        let mut mesh = PolygonMesh::new();
        mesh.points.try_reserve_exact(point_count).ok()?;
        mesh.polygons.try_reserve_exact(polygon_count).ok()?;
        mesh.points.resize(point_count, Default::default());
        mesh.polygons.resize(polygon_count, Default::default());
        Some(mesh)
    }

    fn allocate_spline(&self, point_count: usize, spline_type: SplineType) -> Option<SplineObject> {
        let mut spline = SplineObject::with_points(0, spline_type);
        spline.points.try_reserve_exact(point_count).ok()?;
        spline.points.resize(point_count, Default::default());
        Some(spline)
    }
}

/// Default cap on points per run, roughly 700 MB of surface storage.
pub const POINT_BUDGET: usize = 25_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadingConfig {
    pub max_points_per_thread: usize,
    pub chunk_size: usize,
    /// Workers held back from a surface run for the host.
    pub surface_reserve: usize,
    pub spline_reserve: usize,
    /// Overrides the detected hardware concurrency.
    pub parallelism: Option<usize>,
    /// Largest point count a run may request from the factory. `None`
    /// leaves the limit to the factory.
    pub point_budget: Option<usize>,
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self {
            max_points_per_thread: MAX_POINTS_PER_THREAD,
            chunk_size: CHUNK_SIZE,
            surface_reserve: 1,
            spline_reserve: 0,
            parallelism: None,
            point_budget: Some(POINT_BUDGET),
        }
    }
}

impl ThreadingConfig {
    pub fn available(&self) -> usize {
        self.parallelism
            .unwrap_or_else(available_parallelism)
            .max(1)
    }

    pub fn admits(&self, point_count: usize) -> bool {
        self.point_budget.map_or(true, |budget| point_count <= budget)
    }
}

/// Collaborators shared by every generation run.
#[derive(Clone)]
pub struct GenerationContext {
    pub threading: ThreadingConfig,
    pub factory: Arc<dyn ArtifactFactory>,
    pub optimizer: Arc<dyn Optimizer>,
    pub update_sink: Option<UpdateSink>,
}

impl Default for GenerationContext {
    fn default() -> Self {
        Self {
            threading: ThreadingConfig::default(),
            factory: Arc::new(HeapFactory),
            optimizer: Arc::new(WeldOptimizer),
            update_sink: None,
        }
    }
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threading(mut self, threading: ThreadingConfig) -> Self {
        self.threading = threading;
        self
    }

    pub fn with_factory(mut self, factory: Arc<dyn ArtifactFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_optimizer(mut self, optimizer: Arc<dyn Optimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_update_sink(mut self, sink: UpdateSink) -> Self {
        self.update_sink = Some(sink);
        self
    }

    pub(crate) fn notify(&self, update: &ArtifactUpdate) {
        if let Some(sink) = self.update_sink.as_ref() {
            (sink)(update);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub duration_ms: f32,
    pub worker_count: usize,
    pub optimize_failures: u32,
    pub point_count: usize,
    pub polygon_count: usize,
}

/// Result of a generation request.
#[derive(Debug)]
pub enum Generation<A> {
    /// The change counter matched the last successful run; nothing was built.
    Unchanged,
    Generated { artifact: A, stats: RunStats },
}

impl<A> Generation<A> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Generation::Unchanged)
    }

    pub fn into_artifact(self) -> Option<A> {
        match self {
            Generation::Unchanged => None,
            Generation::Generated { artifact, .. } => Some(artifact),
        }
    }

    pub fn stats(&self) -> Option<&RunStats> {
        match self {
            Generation::Unchanged => None,
            Generation::Generated { stats, .. } => Some(stats),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn heap_factory_sizes_artifacts() {
        let mesh = HeapFactory.allocate_surface(9, 4).unwrap();
        assert_eq!(mesh.point_count(), 9);
        assert_eq!(mesh.polygon_count(), 4);
        let spline = HeapFactory.allocate_spline(40, SplineType::Akima).unwrap();
        assert_eq!(spline.point_count(), 40);
        assert_eq!(spline.spline_type, SplineType::Akima);
    }

    #[test]
    fn heap_factory_reports_impossible_sizes() {
        assert!(HeapFactory.allocate_surface(usize::MAX, 1).is_none());
    }

    #[test]
    fn threading_config_defaults_fill_missing_fields() {
        let config: ThreadingConfig = serde_json::from_str(r#"{"parallelism": 3}"#).unwrap();
        assert_eq!(config.available(), 3);
        assert_eq!(config.max_points_per_thread, MAX_POINTS_PER_THREAD);
        assert_eq!(config.surface_reserve, 1);
        assert_eq!(config.spline_reserve, 0);

        let config = ThreadingConfig {
            parallelism: Some(0),
            ..ThreadingConfig::default()
        };
        assert_eq!(config.available(), 1);
    }

    #[test]
    fn point_budget_is_optional() {
        let config = ThreadingConfig::default();
        assert!(config.admits(POINT_BUDGET));
        assert!(!config.admits(POINT_BUDGET + 1));

        let config: ThreadingConfig = serde_json::from_str(r#"{"point_budget": null}"#).unwrap();
        assert!(config.admits(usize::MAX));
        let config: ThreadingConfig = serde_json::from_str(r#"{"point_budget": 100}"#).unwrap();
        assert_eq!(config.point_budget, Some(100));
        assert!(!config.admits(101));
    }

    #[test]
    fn notify_reaches_the_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let ctx = GenerationContext::new().with_update_sink(Arc::new(move |update| {
            sink_seen.lock().unwrap().push(update.clone());
        }));
        let update = ArtifactUpdate {
            kind: ArtifactKind::Spline,
            change_count: 2,
            point_count: 40,
            polygon_count: 0,
            update_count: 1,
        };
        ctx.notify(&update);
        assert_eq!(seen.lock().unwrap().as_slice(), &[update]);
    }
}
