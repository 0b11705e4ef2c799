use std::f32::consts::TAU;

use glam::Vec3;

use crate::param_spec::ParamSpec;
use crate::params::{ParamId, ParamValue, Params};
use crate::primitives::{spline_params, spline_specs};
use crate::spline::{init_spline_info, ComplexSpline, SplineInfo, SEGMENTS};

pub const NAME: &str = "Torus Knot";

pub const RADIUS: ParamId = ParamId::new(4000);
pub const P: ParamId = ParamId::new(4001);
pub const Q: ParamId = ParamId::new(4002);

pub fn default_params() -> Params {
    spline_params([
        (SEGMENTS, ParamValue::Int(100)),
        (RADIUS, ParamValue::Float(50.0)),
        (P, ParamValue::Float(2.0)),
        (Q, ParamValue::Float(3.0)),
    ])
}

pub fn param_specs() -> Vec<ParamSpec> {
    spline_specs(vec![
        ParamSpec::float_min(RADIUS, "Radius", 0.0),
        ParamSpec::float(P, "P").with_help("Windings around the axis of rotation."),
        ParamSpec::float(Q, "Q").with_help("Windings around the tube."),
    ])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TorusKnot;

pub struct TorusKnotData {
    scale: f32,
    p: f32,
    q: f32,
}

impl ComplexSpline for TorusKnot {
    type Data = TorusKnotData;

    fn init_calculation(&self, params: &Params, info: &mut SplineInfo) -> Result<TorusKnotData, String> {
        init_spline_info(params, info);
        info.min = 0.0;
        info.max = TAU;
        Ok(TorusKnotData {
            scale: params.get_float(RADIUS, 50.0) / 3.0,
            p: params.get_float(P, 2.0),
            q: params.get_float(Q, 3.0),
        })
    }

    fn calc_point(&self, _info: &SplineInfo, data: &TorusKnotData, u: f32, _worker: usize) -> Vec3 {
        let r = (data.q * u).cos() + 2.0;
        Vec3::new(
            r * (data.p * u).cos(),
            r * (data.p * u).sin(),
            -(data.q * u).sin(),
        ) * data.scale
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::context::{Generation, GenerationContext};
    use crate::object::PrimitiveObject;
    use crate::spline::SplineGenerator;

    #[test]
    fn default_knot_is_a_closed_trefoil() {
        let object = PrimitiveObject::new(default_params(), param_specs());
        let mut generator = SplineGenerator::new(TorusKnot);
        let Generation::Generated { artifact, .. } = generator
            .generate(&object, 1, &GenerationContext::new())
            .unwrap()
        else {
            panic!("expected a spline");
        };
        assert_eq!(artifact.point_count(), 100);
        assert!(artifact.closed);
        assert_relative_eq!(artifact.points[0].x, 50.0, epsilon = 1.0e-4);
        assert_relative_eq!(artifact.points[0].z, 0.0, epsilon = 1.0e-4);
    }

    #[test]
    fn points_stay_inside_the_torus() {
        let mut info = SplineInfo::default();
        let data = TorusKnot.init_calculation(&default_params(), &mut info).unwrap();
        for step in 0..32 {
            let u = step as f32 / 32.0 * TAU;
            let p = TorusKnot.calc_point(&info, &data, u, 0);
            let ring = p.truncate().length();
            assert!(ring >= 50.0 / 3.0 - 1.0e-3 && ring <= 50.0 + 1.0e-3);
        }
    }
}
