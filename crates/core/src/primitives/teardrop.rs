use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::param_spec::ParamSpec;
use crate::params::{ParamId, ParamValue, Params};
use crate::primitives::{shape_params, shape_specs};
use crate::shape::{init_shape_info, ComplexShape, ShapeInfo};

pub const NAME: &str = "Teardrop";

pub const A: ParamId = ParamId::new(1000);
pub const B: ParamId = ParamId::new(1001);
pub const LENGTH: ParamId = ParamId::new(1002);
pub const SPHERIFY: ParamId = ParamId::new(1003);

pub fn default_params() -> Params {
    shape_params([
        (A, ParamValue::Float(50.0)),
        (B, ParamValue::Float(1.0)),
        (LENGTH, ParamValue::Float(200.0)),
        (SPHERIFY, ParamValue::Float(0.0)),
    ])
}

pub fn param_specs() -> Vec<ParamSpec> {
    shape_specs(vec![
        ParamSpec::float(A, "A"),
        ParamSpec::float(B, "B"),
        ParamSpec::float_min(LENGTH, "Length", 0.0),
        ParamSpec::float_range(SPHERIFY, "Spherify", 0.0, 1.0)
            .with_help("Blend between the teardrop and a sphere of the same height."),
    ])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Teardrop;

pub struct TeardropData {
    a: f32,
    b: f32,
    half_length: f32,
    spherify: f32,
}

impl ComplexShape for Teardrop {
    type Data = TeardropData;

    fn init_calculation(&self, params: &Params, info: &mut ShapeInfo) -> Result<TeardropData, String> {
        init_shape_info(params, info);
        info.u_min = 0.0;
        info.u_max = PI;
        info.v_min = 0.0;
        info.v_max = TAU;
        Ok(TeardropData {
            a: params.get_float(A, 50.0),
            b: params.get_float(B, 1.0),
            half_length: params.get_float(LENGTH, 200.0) * 0.5,
            spherify: params.get_float(SPHERIFY, 0.0),
        })
    }

    fn calc_point(&self, _info: &ShapeInfo, data: &TeardropData, u: f32, v: f32, _worker: usize) -> Vec3 {
        let r = data.a * (data.b - u.cos()) * u.sin();
        let p = Vec3::new(r * v.cos(), u.cos() * data.half_length, r * v.sin());
        data.spherify * (p.normalize_or_zero() * data.half_length) + (1.0 - data.spherify) * p
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn data(spherify: f32) -> TeardropData {
        let mut params = default_params();
        params.set(SPHERIFY, ParamValue::Float(spherify));
        let mut info = ShapeInfo::default();
        Teardrop.init_calculation(&params, &mut info).unwrap()
    }

    #[test]
    fn tip_and_belly() {
        let info = ShapeInfo::default();
        let tip = Teardrop.calc_point(&info, &data(0.0), 0.0, 0.0, 0);
        assert_relative_eq!(tip.y, 100.0);
        assert_relative_eq!(tip.x, 0.0);

        let belly = Teardrop.calc_point(&info, &data(0.0), PI / 2.0, 0.0, 0);
        assert_relative_eq!(belly.x, 50.0, epsilon = 1.0e-4);
        assert_relative_eq!(belly.y, 0.0, epsilon = 1.0e-4);
    }

    #[test]
    fn full_spherify_projects_onto_half_length() {
        let info = ShapeInfo::default();
        let point = Teardrop.calc_point(&info, &data(1.0), PI / 3.0, 1.0, 0);
        assert_relative_eq!(point.length(), 100.0, epsilon = 1.0e-3);
    }

    #[test]
    fn domain_covers_half_turn_by_full_turn() {
        let mut info = ShapeInfo::default();
        Teardrop.init_calculation(&default_params(), &mut info).unwrap();
        assert_eq!((info.u_min, info.u_max), (0.0, PI));
        assert_eq!((info.v_min, info.v_max), (0.0, TAU));
        assert_eq!((info.u_segments, info.v_segments), (20, 20));
    }
}
