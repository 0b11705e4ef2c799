use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::param_spec::ParamSpec;
use crate::params::{ParamId, ParamValue, Params};
use crate::primitives::{shape_params, shape_specs};
use crate::shape::{init_shape_info, ComplexShape, ShapeInfo};

pub const NAME: &str = "Jet";

pub const SIZE: ParamId = ParamId::new(1000);

pub fn default_params() -> Params {
    shape_params([(SIZE, ParamValue::Vec3([50.0, 50.0, 200.0]))])
}

pub fn param_specs() -> Vec<ParamSpec> {
    shape_specs(vec![ParamSpec::vec3(SIZE, "Size")])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Jet;

impl ComplexShape for Jet {
    type Data = Vec3;

    fn init_calculation(&self, params: &Params, info: &mut ShapeInfo) -> Result<Vec3, String> {
        init_shape_info(params, info);
        // A single weld leaves the pole triangles unmerged.
        info.optimize_passes = 2;
        info.u_min = 0.0;
        info.u_max = PI;
        info.v_min = 0.0;
        info.v_max = TAU;
        let size = Vec3::from(params.get_vec3(SIZE, [50.0, 50.0, 200.0]));
        Ok(Vec3::new(size.x / 3.0, size.y / 3.0, size.z))
    }

    fn calc_point(&self, _info: &ShapeInfo, size: &Vec3, u: f32, v: f32, _worker: usize) -> Vec3 {
        let cosh_max = PI.cosh();
        let flare = (1.0 - u.cosh()) * u.sin() * 0.5;
        Vec3::new(
            flare * v.cos() * size.x,
            flare * v.sin() * size.y,
            ((u.cosh() - 1.0) / (cosh_max - 1.0)) * size.z - size.z * 0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn spans_the_full_height() {
        let mut info = ShapeInfo::default();
        let size = Jet.init_calculation(&default_params(), &mut info).unwrap();
        assert_eq!(info.optimize_passes, 2);
        let bottom = Jet.calc_point(&info, &size, 0.0, 0.0, 0);
        let top = Jet.calc_point(&info, &size, PI, 0.0, 0);
        assert_relative_eq!(bottom.z, -100.0, epsilon = 1.0e-3);
        assert_relative_eq!(top.z, 100.0, epsilon = 1.0e-3);
        assert_relative_eq!(bottom.x, 0.0);
    }
}
