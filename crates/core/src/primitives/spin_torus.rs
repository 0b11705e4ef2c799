use std::f32::consts::TAU;

use glam::Vec3;

use crate::mesh::PolygonMesh;
use crate::param_spec::ParamSpec;
use crate::params::{ParamId, ParamValue, Params};
use crate::primitives::{shape_params, shape_specs};
use crate::shape::{init_shape_info, ComplexShape, ShapeInfo, USEGMENTS, VSEGMENTS};

pub const NAME: &str = "Spin Torus";

pub const RADIUS: ParamId = ParamId::new(1000);
pub const PIPE_RADIUS: ParamId = ParamId::new(1001);

pub fn default_params() -> Params {
    shape_params([
        (USEGMENTS, ParamValue::Int(40)),
        (VSEGMENTS, ParamValue::Int(40)),
        (RADIUS, ParamValue::Float(100.0)),
        (PIPE_RADIUS, ParamValue::Float(20.0)),
    ])
}

pub fn param_specs() -> Vec<ParamSpec> {
    shape_specs(vec![
        ParamSpec::float_min(RADIUS, "Radius", 0.0),
        ParamSpec::float_min(PIPE_RADIUS, "Pipe Radius", 0.0),
    ])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpinTorus;

pub struct SpinTorusData {
    radius: f32,
    pipe_radius: f32,
}

impl ComplexShape for SpinTorus {
    type Data = SpinTorusData;

    fn init_calculation(&self, params: &Params, info: &mut ShapeInfo) -> Result<SpinTorusData, String> {
        init_shape_info(params, info);
        info.u_min = 0.0;
        info.v_min = 0.0;
        info.u_max = TAU;
        info.v_max = TAU;
        let pipe_radius = params.get_float(PIPE_RADIUS, 20.0);
        Ok(SpinTorusData {
            radius: params.get_float(RADIUS, 100.0) + pipe_radius,
            pipe_radius,
        })
    }

    fn calc_point(&self, _info: &ShapeInfo, data: &SpinTorusData, u: f32, v: f32, _worker: usize) -> Vec3 {
        let (half_sin, half_cos) = (u / 2.0).sin_cos();
        let r = data.pipe_radius;
        let ring = data.radius + r * (half_cos * v.sin() - half_sin * (2.0 * v).sin());
        let x = ring * u.cos();
        let y = ring * u.sin();
        let z = r * (half_sin * v.sin() + half_cos * (2.0 * v).sin());
        Vec3::new(x, z, y)
    }

    /// The first half of every v-ring faces inward; flip it.
    fn post_process_calculation(
        &self,
        _params: &Params,
        info: &mut ShapeInfo,
        _data: &mut SpinTorusData,
        target: &mut Option<PolygonMesh>,
    ) {
        let (Some(mesh), Ok(v_segments)) = (target.as_mut(), usize::try_from(info.v_segments)) else {
            return;
        };
        if v_segments == 0 {
            return;
        }
        for index in 0..mesh.polygon_count() {
            if index % v_segments < v_segments / 2 {
                mesh.reverse_polygon(index);
            }
        }
    }
}
