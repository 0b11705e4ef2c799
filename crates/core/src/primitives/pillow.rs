use std::f32::consts::PI;

use glam::Vec3;

use crate::param_spec::ParamSpec;
use crate::params::{ParamId, ParamValue, Params};
use crate::primitives::{shape_params, shape_specs};
use crate::shape::{init_shape_info, ComplexShape, ShapeInfo};

pub const NAME: &str = "Pillow";

pub const SIZE: ParamId = ParamId::new(1000);

pub fn default_params() -> Params {
    shape_params([(SIZE, ParamValue::Vec3([200.0, 200.0, 100.0]))])
}

pub fn param_specs() -> Vec<ParamSpec> {
    shape_specs(vec![ParamSpec::vec3(SIZE, "Size")])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Pillow;

impl ComplexShape for Pillow {
    /// Half extents.
    type Data = Vec3;

    fn init_calculation(&self, params: &Params, info: &mut ShapeInfo) -> Result<Vec3, String> {
        init_shape_info(params, info);
        info.u_min = 0.0;
        info.u_max = PI;
        info.v_min = -PI;
        info.v_max = PI;
        // The parametrization faces inward.
        info.inverse_normals = true;
        info.flip_uv_y = true;
        Ok(Vec3::from(params.get_vec3(SIZE, [200.0, 200.0, 100.0])) * 0.5)
    }

    fn calc_point(&self, _info: &ShapeInfo, size: &Vec3, u: f32, v: f32, _worker: usize) -> Vec3 {
        Vec3::new(u.cos() * size.x, v.cos() * size.y, u.sin() * v.sin() * size.z)
    }
}
