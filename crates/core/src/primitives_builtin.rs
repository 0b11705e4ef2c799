use crate::context::{Generation, GenerationContext, RunStats};
use crate::error::{GenerationError, Result};
use crate::mesh::{PolygonMesh, ShadingTag};
use crate::object::PrimitiveObject;
use crate::param_spec::ParamSpec;
use crate::params::{ParamId, ParamValue, Params};
use crate::primitives::{expression, jet, pillow, seashell, spin_torus, teardrop, torus_knot, umbilic_torus};
use crate::shape::{self, ShapeGenerator};
use crate::spline::{self, SplineGenerator};
use crate::spline_object::SplineObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Teardrop,
    Seashell,
    UmbilicTorus,
    Pillow,
    Jet,
    SpinTorus,
    Expression,
    TorusKnot,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Teardrop,
        PrimitiveKind::Seashell,
        PrimitiveKind::UmbilicTorus,
        PrimitiveKind::Pillow,
        PrimitiveKind::Jet,
        PrimitiveKind::SpinTorus,
        PrimitiveKind::Expression,
        PrimitiveKind::TorusKnot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Teardrop => teardrop::NAME,
            PrimitiveKind::Seashell => seashell::NAME,
            PrimitiveKind::UmbilicTorus => umbilic_torus::NAME,
            PrimitiveKind::Pillow => pillow::NAME,
            PrimitiveKind::Jet => jet::NAME,
            PrimitiveKind::SpinTorus => spin_torus::NAME,
            PrimitiveKind::Expression => expression::NAME,
            PrimitiveKind::TorusKnot => torus_knot::NAME,
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<PrimitiveKind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn is_spline(self) -> bool {
        matches!(self, PrimitiveKind::TorusKnot)
    }

    pub fn default_params(self) -> Params {
        match self {
            PrimitiveKind::Teardrop => teardrop::default_params(),
            PrimitiveKind::Seashell => seashell::default_params(),
            PrimitiveKind::UmbilicTorus => umbilic_torus::default_params(),
            PrimitiveKind::Pillow => pillow::default_params(),
            PrimitiveKind::Jet => jet::default_params(),
            PrimitiveKind::SpinTorus => spin_torus::default_params(),
            PrimitiveKind::Expression => expression::default_params(),
            PrimitiveKind::TorusKnot => torus_knot::default_params(),
        }
    }

    pub fn param_specs(self) -> Vec<ParamSpec> {
        match self {
            PrimitiveKind::Teardrop => teardrop::param_specs(),
            PrimitiveKind::Seashell => seashell::param_specs(),
            PrimitiveKind::UmbilicTorus => umbilic_torus::param_specs(),
            PrimitiveKind::Pillow => pillow::param_specs(),
            PrimitiveKind::Jet => jet::param_specs(),
            PrimitiveKind::SpinTorus => spin_torus::param_specs(),
            PrimitiveKind::Expression => expression::param_specs(),
            PrimitiveKind::TorusKnot => torus_knot::param_specs(),
        }
    }

    /// Key of the read-only "last run" string.
    pub fn status_param(self) -> ParamId {
        if self.is_spline() {
            spline::LASTRUN
        } else {
            shape::LASTRUN
        }
    }

    /// Default object; surfaces come with a default shading tag.
    pub fn new_object(self) -> PrimitiveObject {
        let object = PrimitiveObject::new(self.default_params(), self.param_specs());
        if self.is_spline() {
            object
        } else {
            object.with_shading(ShadingTag::default())
        }
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PrimitiveKind {
    type Err = GenerationError;

    fn from_str(name: &str) -> Result<Self> {
        PrimitiveKind::from_name(name).ok_or_else(|| GenerationError::UnknownPrimitive(name.to_string()))
    }
}

#[derive(Debug, Clone)]
pub enum Artifact {
    Surface(PolygonMesh),
    Spline(SplineObject),
}

impl Artifact {
    pub fn point_count(&self) -> usize {
        match self {
            Artifact::Surface(mesh) => mesh.point_count(),
            Artifact::Spline(spline) => spline.point_count(),
        }
    }

    pub fn as_surface(&self) -> Option<&PolygonMesh> {
        match self {
            Artifact::Surface(mesh) => Some(mesh),
            Artifact::Spline(_) => None,
        }
    }

    pub fn as_spline(&self) -> Option<&SplineObject> {
        match self {
            Artifact::Spline(spline) => Some(spline),
            Artifact::Surface(_) => None,
        }
    }
}

enum Generator {
    Teardrop(ShapeGenerator<teardrop::Teardrop>),
    Seashell(ShapeGenerator<seashell::Seashell>),
    UmbilicTorus(ShapeGenerator<umbilic_torus::UmbilicTorus>),
    Pillow(ShapeGenerator<pillow::Pillow>),
    Jet(ShapeGenerator<jet::Jet>),
    SpinTorus(ShapeGenerator<spin_torus::SpinTorus>),
    Expression(ShapeGenerator<expression::Expression>),
    TorusKnot(SplineGenerator<torus_knot::TorusKnot>),
}

impl Generator {
    fn new(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Teardrop => Generator::Teardrop(ShapeGenerator::new(teardrop::Teardrop)),
            PrimitiveKind::Seashell => Generator::Seashell(ShapeGenerator::new(seashell::Seashell)),
            PrimitiveKind::UmbilicTorus => {
                Generator::UmbilicTorus(ShapeGenerator::new(umbilic_torus::UmbilicTorus))
            }
            PrimitiveKind::Pillow => Generator::Pillow(ShapeGenerator::new(pillow::Pillow)),
            PrimitiveKind::Jet => Generator::Jet(ShapeGenerator::new(jet::Jet)),
            PrimitiveKind::SpinTorus => Generator::SpinTorus(ShapeGenerator::new(spin_torus::SpinTorus)),
            PrimitiveKind::Expression => {
                Generator::Expression(ShapeGenerator::new(expression::Expression))
            }
            PrimitiveKind::TorusKnot => Generator::TorusKnot(SplineGenerator::new(torus_knot::TorusKnot)),
        }
    }

    fn generate(
        &mut self,
        object: &PrimitiveObject,
        change_count: u64,
        ctx: &GenerationContext,
    ) -> Result<Generation<Artifact>> {
        match self {
            Generator::Teardrop(g) => surface(g.generate(object, change_count, ctx)),
            Generator::Seashell(g) => surface(g.generate(object, change_count, ctx)),
            Generator::UmbilicTorus(g) => surface(g.generate(object, change_count, ctx)),
            Generator::Pillow(g) => surface(g.generate(object, change_count, ctx)),
            Generator::Jet(g) => surface(g.generate(object, change_count, ctx)),
            Generator::SpinTorus(g) => surface(g.generate(object, change_count, ctx)),
            Generator::Expression(g) => surface(g.generate(object, change_count, ctx)),
            Generator::TorusKnot(g) => Ok(match g.generate(object, change_count, ctx)? {
                Generation::Unchanged => Generation::Unchanged,
                Generation::Generated { artifact, stats } => Generation::Generated {
                    artifact: Artifact::Spline(artifact),
                    stats,
                },
            }),
        }
    }

    fn invalidate(&mut self) {
        match self {
            Generator::Teardrop(g) => g.invalidate(),
            Generator::Seashell(g) => g.invalidate(),
            Generator::UmbilicTorus(g) => g.invalidate(),
            Generator::Pillow(g) => g.invalidate(),
            Generator::Jet(g) => g.invalidate(),
            Generator::SpinTorus(g) => g.invalidate(),
            Generator::Expression(g) => g.invalidate(),
            Generator::TorusKnot(g) => g.invalidate(),
        }
    }
}

fn surface(result: Result<Generation<PolygonMesh>>) -> Result<Generation<Artifact>> {
    Ok(match result? {
        Generation::Unchanged => Generation::Unchanged,
        Generation::Generated { artifact, stats } => Generation::Generated {
            artifact: Artifact::Surface(artifact),
            stats,
        },
    })
}

fn status_line(stats: &RunStats) -> String {
    format!(
        "{:.2} ms, {} points, {} polygons, {} threads",
        stats.duration_ms, stats.point_count, stats.polygon_count, stats.worker_count
    )
}

/// One primitive as it lives in a document: its object, the generator
/// (and cache) that turns the object into geometry, and the last artifact
/// it produced.
pub struct Primitive {
    kind: PrimitiveKind,
    object: PrimitiveObject,
    generator: Generator,
    last: Option<Artifact>,
}

impl Primitive {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self::with_object(kind, kind.new_object())
    }

    pub fn with_object(kind: PrimitiveKind, object: PrimitiveObject) -> Self {
        Self {
            kind,
            object,
            generator: Generator::new(kind),
            last: None,
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn object(&self) -> &PrimitiveObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut PrimitiveObject {
        &mut self.object
    }

    pub fn set_param(&mut self, key: ParamId, value: ParamValue) -> std::result::Result<bool, String> {
        self.object.set_param(key, value)
    }

    /// The artifact of the last successful build. Failed runs and
    /// unchanged requests leave it in place.
    pub fn current(&self) -> Option<&Artifact> {
        self.last.as_ref()
    }

    /// Forces the next `generate` to rebuild.
    pub fn invalidate(&mut self) {
        self.generator.invalidate();
    }

    /// Regenerates if the object changed since the last successful run and
    /// records the run in the object's "last run" string. A fresh artifact
    /// is returned and also kept as [`Primitive::current`].
    pub fn generate(&mut self, ctx: &GenerationContext) -> Result<Generation<Artifact>> {
        let change_count = self.object.dirty_count();
        let generation = self.generator.generate(&self.object, change_count, ctx)?;
        if let Generation::Generated { artifact, stats } = &generation {
            let line = status_line(stats);
            tracing::info!("{} generated: {}", self.kind, line);
            self.object.set_status(self.kind.status_param(), line);
            self.last = Some(artifact.clone());
        }
        Ok(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ThreadingConfig;
    use crate::mesh::Polygon;

    #[test]
    fn names_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_name("spin torus"), Some(PrimitiveKind::SpinTorus));
        assert!(matches!(
            "Klein Bottle".parse::<PrimitiveKind>(),
            Err(GenerationError::UnknownPrimitive(_))
        ));
    }

    #[test]
    fn every_kind_builds_with_defaults() {
        let ctx = GenerationContext::new();
        for kind in PrimitiveKind::ALL {
            let mut primitive = Primitive::new(kind);
            let artifact = primitive
                .generate(&ctx)
                .unwrap_or_else(|err| panic!("{kind}: {err}"))
                .into_artifact()
                .unwrap_or_else(|| panic!("{kind} produced nothing"));
            match artifact {
                Artifact::Surface(mesh) => {
                    assert!(!kind.is_spline());
                    assert!(mesh.polygon_count() > 0, "{kind}");
                    assert!(mesh.has_valid_indices(), "{kind}");
                    assert!(mesh.points.iter().all(|p| p.is_finite()), "{kind}");
                }
                Artifact::Spline(spline) => {
                    assert!(kind.is_spline());
                    assert!(spline.point_count() > 0);
                }
            }
        }
    }

    #[test]
    fn status_write_does_not_dirty_the_object() {
        let ctx = GenerationContext::new();
        let mut primitive = Primitive::new(PrimitiveKind::Pillow);
        let before = primitive.object().dirty_count();
        assert!(!primitive.generate(&ctx).unwrap().is_unchanged());
        assert_eq!(primitive.object().dirty_count(), before);
        let status = primitive.object().params().get_string(shape::LASTRUN, "");
        assert!(status.contains("441 points"), "{status}");

        assert!(primitive.generate(&ctx).unwrap().is_unchanged());
    }

    #[test]
    fn edits_trigger_a_rebuild() {
        let ctx = GenerationContext::new();
        let mut primitive = Primitive::new(PrimitiveKind::TorusKnot);
        primitive.generate(&ctx).unwrap();
        assert!(primitive.set_param(spline::SEGMENTS, ParamValue::Int(12)).unwrap());
        let artifact = primitive.generate(&ctx).unwrap().into_artifact().unwrap();
        assert_eq!(artifact.point_count(), 12);

        assert!(!primitive.set_param(spline::SEGMENTS, ParamValue::Int(12)).unwrap());
        assert!(primitive.generate(&ctx).unwrap().is_unchanged());
        primitive.invalidate();
        assert!(!primitive.generate(&ctx).unwrap().is_unchanged());
    }

    #[test]
    fn segment_edits_clamp_to_one() {
        let mut primitive = Primitive::new(PrimitiveKind::Pillow);
        primitive.set_param(shape::USEGMENTS, ParamValue::Int(0)).unwrap();
        primitive.set_param(shape::VSEGMENTS, ParamValue::Int(1)).unwrap();
        assert_eq!(primitive.object().params().get_int(shape::USEGMENTS, -1), 1);
        let artifact = primitive
            .generate(&GenerationContext::new())
            .unwrap()
            .into_artifact()
            .unwrap();
        let mesh = artifact.as_surface().unwrap();
        assert_eq!(mesh.point_count(), 4);
        // Pillow forces inverse normals.
        assert_eq!(mesh.polygons[0], Polygon::quad(2, 3, 1, 0));
    }

    #[test]
    fn current_artifact_survives_unchanged_and_failed_runs() {
        let mut primitive = Primitive::new(PrimitiveKind::Pillow);
        assert!(primitive.current().is_none());
        let ctx = GenerationContext::new();
        primitive.generate(&ctx).unwrap();
        assert_eq!(primitive.current().map(Artifact::point_count), Some(441));

        assert!(primitive.generate(&ctx).unwrap().is_unchanged());
        assert_eq!(primitive.current().map(Artifact::point_count), Some(441));

        primitive.set_param(shape::USEGMENTS, ParamValue::Int(30)).unwrap();
        let starved = GenerationContext::new().with_threading(ThreadingConfig {
            point_budget: Some(100),
            ..ThreadingConfig::default()
        });
        assert!(matches!(
            primitive.generate(&starved),
            Err(GenerationError::Allocation(_))
        ));
        assert_eq!(primitive.current().map(Artifact::point_count), Some(441));

        primitive.generate(&ctx).unwrap();
        assert_eq!(primitive.current().map(Artifact::point_count), Some(31 * 21));
    }

    #[test]
    fn surfaces_start_with_a_default_shading_tag() {
        let mut primitive = Primitive::new(PrimitiveKind::Teardrop);
        assert_eq!(primitive.object().dirty_count(), 0);
        let artifact = primitive
            .generate(&GenerationContext::new())
            .unwrap()
            .into_artifact()
            .unwrap();
        assert_eq!(artifact.as_surface().unwrap().shading, Some(ShadingTag::default()));
        assert!(PrimitiveKind::TorusKnot.new_object().shading().is_none());
    }

    #[test]
    fn status_param_cannot_be_edited() {
        let mut primitive = Primitive::new(PrimitiveKind::Jet);
        assert!(primitive
            .set_param(shape::LASTRUN, ParamValue::String("x".to_string()))
            .is_err());
    }
}
