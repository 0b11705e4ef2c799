mod cache;
mod context;
mod error;
mod formula;
mod mesh;
mod object;
mod obj_output;
mod optimize;
mod parallel;
mod param_spec;
mod params;
mod primitives_builtin;
mod profile;
mod spline_object;
mod uv;

pub mod primitives;
pub mod shape;
pub mod spline;

pub use cache::DirtyCache;
pub use context::{
    ArtifactFactory, ArtifactKind, ArtifactUpdate, Generation, GenerationContext, HeapFactory,
    RunStats, ThreadingConfig, UpdateSink, POINT_BUDGET,
};
pub use error::{GenerationError, Result, SegmentAxis};
pub use mesh::{reverse_uv_quad, Aabb, Polygon, PolygonMesh, ShadingTag, UvQuad};
pub use object::PrimitiveObject;
pub use obj_output::{write_obj, write_spline_obj};
#[cfg(not(target_arch = "wasm32"))]
pub use obj_output::save_obj;
pub use optimize::{weld_mesh, weld_spline, Optimizer, WeldOptimizer};
pub use parallel::{
    available_parallelism, fill_indexed, worker_count, ClaimedRange, WorkQueue, CHUNK_SIZE,
    MAX_POINTS_PER_THREAD,
};
pub use param_spec::{ParamKind, ParamOption, ParamRange, ParamSpec};
pub use params::{ParamId, ParamValue, Params};
pub use primitives_builtin::{Artifact, Primitive, PrimitiveKind};
pub use profile::Profile;
pub use shape::{build_shape, BaseComplexShape, ComplexShape, ShapeGenerator, ShapeInfo};
pub use spline::{build_spline, BaseComplexSpline, ComplexSpline, SplineGenerator, SplineInfo};
pub use spline_object::{InterpolationSettings, SplineInterpolation, SplineObject, SplineType};
pub use uv::{cell_corners, make_planar_uvs, quad_for_cell, uv_quad_for_cell, Winding};
