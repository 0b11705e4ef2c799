use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::param_spec::ParamSpec;
use crate::params::{ParamId, ParamValue, Params};
use crate::primitives::{shape_params, shape_specs};
use crate::shape::{init_shape_info, ComplexShape, ShapeInfo, USEGMENTS, VSEGMENTS};

pub const NAME: &str = "Umbilic Torus";

pub const RADIUS: ParamId = ParamId::new(1000);
pub const PIPE_RADIUS: ParamId = ParamId::new(1001);
pub const SMOOTHNESS: ParamId = ParamId::new(1002);
pub const SLICE: ParamId = ParamId::new(1003);
pub const DEGREE_MIN: ParamId = ParamId::new(1004);
pub const DEGREE_MAX: ParamId = ParamId::new(1005);

const PIPE_SCALE: f32 = 0.785;

pub fn default_params() -> Params {
    shape_params([
        (USEGMENTS, ParamValue::Int(40)),
        (VSEGMENTS, ParamValue::Int(21)),
        (RADIUS, ParamValue::Float(100.0)),
        (PIPE_RADIUS, ParamValue::Float(25.0)),
        (SMOOTHNESS, ParamValue::Float(2.0)),
        (SLICE, ParamValue::Bool(false)),
        (DEGREE_MIN, ParamValue::Float(0.0)),
        (DEGREE_MAX, ParamValue::Float(TAU)),
    ])
}

pub fn param_specs() -> Vec<ParamSpec> {
    shape_specs(vec![
        ParamSpec::float_min(RADIUS, "Radius", 0.0),
        ParamSpec::float_min(PIPE_RADIUS, "Pipe Radius", 0.0),
        ParamSpec::float_min(SMOOTHNESS, "Smoothness", 1.0),
        ParamSpec::bool(SLICE, "Slice"),
        ParamSpec::float_range(DEGREE_MIN, "From", 0.0, TAU),
        ParamSpec::float_range(DEGREE_MAX, "To", 0.0, TAU),
    ])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UmbilicTorus;

pub struct UmbilicData {
    radius: f32,
    inner_radius: f32,
    inv_smooth: f32,
}

impl ComplexShape for UmbilicTorus {
    type Data = UmbilicData;

    fn init_calculation(&self, params: &Params, info: &mut ShapeInfo) -> Result<UmbilicData, String> {
        init_shape_info(params, info);
        let inner_radius = params.get_float(PIPE_RADIUS, 25.0) * PIPE_SCALE;
        let smooth = params.get_float(SMOOTHNESS, 2.0).max(1.0);

        if params.get_bool(SLICE, false) {
            info.u_min = params.get_float(DEGREE_MIN, 0.0) - PI;
            info.u_max = params.get_float(DEGREE_MAX, TAU) - PI;
        } else {
            info.u_min = -PI;
            info.u_max = PI;
        }
        info.v_min = -PI;
        info.v_max = PI;

        Ok(UmbilicData {
            radius: params.get_float(RADIUS, 100.0),
            inner_radius,
            inv_smooth: inner_radius / smooth,
        })
    }

    fn calc_point(&self, _info: &ShapeInfo, data: &UmbilicData, u: f32, v: f32, _worker: usize) -> Vec3 {
        let u3 = u / 3.0;
        let ring = data.radius
            + data.inner_radius
            + (u3 - 2.0 * v).cos() * data.inv_smooth
            + data.inner_radius * (u3 + v).cos();
        let x = u.sin() * ring;
        let y = u.cos() * ring;
        let z = (u3 - 2.0 * v).sin() * data.inv_smooth + data.inner_radius * (u3 + v).sin();
        Vec3::new(x, -z, y)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn slice_narrows_the_u_domain() {
        let mut params = default_params();
        let mut info = ShapeInfo::default();
        UmbilicTorus.init_calculation(&params, &mut info).unwrap();
        assert_eq!((info.u_min, info.u_max), (-PI, PI));
        assert_eq!((info.u_segments, info.v_segments), (40, 21));

        params.set(SLICE, ParamValue::Bool(true));
        params.set(DEGREE_MAX, ParamValue::Float(PI));
        let mut info = ShapeInfo::default();
        UmbilicTorus.init_calculation(&params, &mut info).unwrap();
        assert_eq!((info.u_min, info.u_max), (-PI, 0.0));
    }

    #[test]
    fn smoothness_is_floored_at_one() {
        let mut params = default_params();
        params.set(SMOOTHNESS, ParamValue::Float(0.1));
        let mut info = ShapeInfo::default();
        let data = UmbilicTorus.init_calculation(&params, &mut info).unwrap();
        assert_relative_eq!(data.inv_smooth, data.inner_radius);
    }

    #[test]
    fn origin_of_domain_sits_on_the_ring() {
        let mut info = ShapeInfo::default();
        let data = UmbilicTorus.init_calculation(&default_params(), &mut info).unwrap();
        let p = UmbilicTorus.calc_point(&info, &data, 0.0, 0.0, 0);
        let expected = 100.0 + 2.0 * data.inner_radius + data.inv_smooth;
        assert_relative_eq!(p.z, expected, epsilon = 1.0e-3);
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 0.0);
    }
}
