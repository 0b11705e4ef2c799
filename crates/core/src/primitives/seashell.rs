use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::param_spec::ParamSpec;
use crate::params::{ParamId, ParamValue, Params};
use crate::primitives::{shape_params, shape_specs};
use crate::profile::Profile;
use crate::shape::{init_shape_info, ComplexShape, ShapeInfo, USEGMENTS, VSEGMENTS};

pub const NAME: &str = "Seashell";

pub const RADIUS: ParamId = ParamId::new(1000);
pub const PIPE_RADIUS: ParamId = ParamId::new(1001);
pub const HEIGHT: ParamId = ParamId::new(1002);
pub const DEGREES: ParamId = ParamId::new(1003);
pub const RADIUS_PROFILE: ParamId = ParamId::new(1005);
pub const PIPE_PROFILE: ParamId = ParamId::new(1006);

const DEFAULT_RADIUS_PROFILE: &str = "0 1; 1 1";
const DEFAULT_PIPE_PROFILE: &str = "0 1; 1 0";

pub fn default_params() -> Params {
    shape_params([
        (USEGMENTS, ParamValue::Int(20)),
        (VSEGMENTS, ParamValue::Int(50)),
        (RADIUS, ParamValue::Float(50.0)),
        (PIPE_RADIUS, ParamValue::Float(50.0)),
        (HEIGHT, ParamValue::Float(150.0)),
        (DEGREES, ParamValue::Float(2.0 * TAU)),
        (
            RADIUS_PROFILE,
            ParamValue::String(DEFAULT_RADIUS_PROFILE.to_string()),
        ),
        (
            PIPE_PROFILE,
            ParamValue::String(DEFAULT_PIPE_PROFILE.to_string()),
        ),
    ])
}

pub fn param_specs() -> Vec<ParamSpec> {
    shape_specs(vec![
        ParamSpec::float_min(RADIUS, "Radius", 0.0),
        ParamSpec::float_min(PIPE_RADIUS, "Pipe Radius", 0.0),
        ParamSpec::float(HEIGHT, "Height"),
        ParamSpec::float(DEGREES, "Degrees").with_help("Total twist in radians."),
        ParamSpec::string(RADIUS_PROFILE, "Radius Profile")
            .with_help("Radius scale along the shell as 't y' pairs separated by ';'."),
        ParamSpec::string(PIPE_PROFILE, "Pipe Profile"),
    ])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Seashell;

pub struct SeashellData {
    pipe_radius: f32,
    height: f32,
    radius: f32,
    turns: f32,
    radius_profile: Profile,
    pipe_profile: Profile,
}

impl ComplexShape for Seashell {
    type Data = SeashellData;

    fn init_calculation(&self, params: &Params, info: &mut ShapeInfo) -> Result<SeashellData, String> {
        init_shape_info(params, info);
        info.u_min = 0.0;
        info.u_max = 2.0;
        info.v_min = 0.0;
        info.v_max = 2.0;
        Ok(SeashellData {
            pipe_radius: params.get_float(PIPE_RADIUS, 50.0),
            height: params.get_float(HEIGHT, 150.0),
            radius: params.get_float(RADIUS, 50.0),
            turns: params.get_float(DEGREES, 2.0 * TAU) / TAU,
            radius_profile: Profile::parse(params.get_string(RADIUS_PROFILE, DEFAULT_RADIUS_PROFILE))?,
            pipe_profile: Profile::parse(params.get_string(PIPE_PROFILE, DEFAULT_PIPE_PROFILE))?,
        })
    }

    fn calc_point(&self, info: &ShapeInfo, data: &SeashellData, u: f32, v: f32, _worker: usize) -> Vec3 {
        let t = (v - info.v_min) / (info.v_max - info.v_min);
        let rt = data.radius_profile.sample(t);
        let h = data.pipe_profile.sample(t);
        let angle = data.turns * v * PI;
        let tube = data.pipe_radius * h * (1.0 + (u * PI).cos());
        Vec3::new(
            tube * angle.cos() + data.radius * rt * angle.cos(),
            -(data.height * 0.5 * v + data.pipe_radius * h * (u * PI).sin()),
            tube * angle.sin() + data.radius * rt * angle.sin(),
        )
    }
}
