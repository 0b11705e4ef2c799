pub mod expression;
pub mod jet;
pub mod pillow;
pub mod seashell;
pub mod spin_torus;
pub mod teardrop;
pub mod torus_knot;
pub mod umbilic_torus;

use crate::param_spec::ParamSpec;
use crate::params::{ParamId, ParamValue, Params};
use crate::shape::{base_shape_params, base_shape_specs};
use crate::spline::{base_spline_params, base_spline_specs};

pub fn shape_params(values: impl IntoIterator<Item = (ParamId, ParamValue)>) -> Params {
    let mut params = base_shape_params();
    for (key, value) in values {
        params.set(key, value);
    }
    params
}

pub fn shape_specs(extra: Vec<ParamSpec>) -> Vec<ParamSpec> {
    let mut specs = base_shape_specs();
    specs.extend(extra);
    specs
}

pub fn spline_params(values: impl IntoIterator<Item = (ParamId, ParamValue)>) -> Params {
    let mut params = base_spline_params();
    for (key, value) in values {
        params.set(key, value);
    }
    params
}

pub fn spline_specs(extra: Vec<ParamSpec>) -> Vec<ParamSpec> {
    let mut specs = base_spline_specs();
    specs.extend(extra);
    specs
}
