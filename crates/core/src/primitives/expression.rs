use std::f32::consts::PI;

use glam::Vec3;

use crate::formula::{Constants, Formula};
use crate::param_spec::ParamSpec;
use crate::params::{ParamId, ParamValue, Params};
use crate::primitives::{shape_params, shape_specs};
use crate::shape::{init_shape_info, ComplexShape, ShapeInfo, USEGMENTS};

pub const NAME: &str = "Expression";

pub const X_EXPR: ParamId = ParamId::new(1000);
pub const Y_EXPR: ParamId = ParamId::new(1001);
pub const Z_EXPR: ParamId = ParamId::new(1002);
pub const VARIABLES: ParamId = ParamId::new(1003);
pub const U_MIN: ParamId = ParamId::new(1004);
pub const U_MAX: ParamId = ParamId::new(1005);
pub const V_MIN: ParamId = ParamId::new(1006);
pub const V_MAX: ParamId = ParamId::new(1007);
pub const INVERSE_NORMALS: ParamId = ParamId::new(1008);
pub const ROTATE_POLYGONS: ParamId = ParamId::new(1009);
pub const FLIP_UV_X: ParamId = ParamId::new(1010);
pub const FLIP_UV_Y: ParamId = ParamId::new(1011);

const DEFAULT_X: &str = "cos(u) * 100";
const DEFAULT_Y: &str = "cos(v) * 100";
const DEFAULT_Z: &str = "cos(u + v) * 100";

pub fn default_params() -> Params {
    shape_params([
        (USEGMENTS, ParamValue::Int(10)),
        (X_EXPR, ParamValue::String(DEFAULT_X.to_string())),
        (Y_EXPR, ParamValue::String(DEFAULT_Y.to_string())),
        (Z_EXPR, ParamValue::String(DEFAULT_Z.to_string())),
        (VARIABLES, ParamValue::String(String::new())),
        (U_MIN, ParamValue::Float(0.0)),
        (U_MAX, ParamValue::Float(PI)),
        (V_MIN, ParamValue::Float(-PI)),
        (V_MAX, ParamValue::Float(PI)),
        (INVERSE_NORMALS, ParamValue::Bool(false)),
        (ROTATE_POLYGONS, ParamValue::Bool(true)),
        (FLIP_UV_X, ParamValue::Bool(false)),
        (FLIP_UV_Y, ParamValue::Bool(false)),
    ])
}

pub fn param_specs() -> Vec<ParamSpec> {
    shape_specs(vec![
        ParamSpec::string(X_EXPR, "X").with_help("Formula in u, v and the variables."),
        ParamSpec::string(Y_EXPR, "Y"),
        ParamSpec::string(Z_EXPR, "Z"),
        ParamSpec::string(VARIABLES, "Variables")
            .with_help("`name = value` lines; later lines may use earlier names."),
        ParamSpec::float(U_MIN, "U Min"),
        ParamSpec::float(U_MAX, "U Max"),
        ParamSpec::float(V_MIN, "V Min"),
        ParamSpec::float(V_MAX, "V Max"),
        ParamSpec::bool(INVERSE_NORMALS, "Inverse Normals"),
        ParamSpec::bool(ROTATE_POLYGONS, "Rotate Polygons"),
        ParamSpec::bool(FLIP_UV_X, "Flip UV X"),
        ParamSpec::bool(FLIP_UV_Y, "Flip UV Y"),
    ])
}

/// The three coordinate formulas of one worker.
#[derive(Debug, Clone)]
pub struct SurfaceProgram {
    x: Formula,
    y: Formula,
    z: Formula,
}

impl SurfaceProgram {
    pub fn compile(x: &str, y: &str, z: &str, variables: &str) -> Result<Self, String> {
        let constants = Constants::parse(variables).map_err(|err| format!("variables: {err}"))?;
        Ok(Self {
            x: Formula::parse(x, &constants).map_err(|err| format!("x: {err}"))?,
            y: Formula::parse(y, &constants).map_err(|err| format!("y: {err}"))?,
            z: Formula::parse(z, &constants).map_err(|err| format!("z: {err}"))?,
        })
    }

    /// A point that does not evaluate to finite coordinates lands on the origin.
    pub fn eval(&self, u: f32, v: f32) -> Vec3 {
        let point = Vec3::new(self.x.eval(u, v), self.y.eval(u, v), self.z.eval(u, v));
        if point.is_finite() {
            point
        } else {
            Vec3::ZERO
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpressionData {
    /// Indexed by worker; filled by `init_thread_activity`.
    programs: Vec<SurfaceProgram>,
}

impl ExpressionData {
    pub fn worker_programs(&self) -> usize {
        self.programs.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Expression;

impl ComplexShape for Expression {
    type Data = ExpressionData;

    fn init_calculation(&self, params: &Params, info: &mut ShapeInfo) -> Result<ExpressionData, String> {
        init_shape_info(params, info);
        // A single weld leaves triangles that collapse onto one point.
        info.optimize_passes = 2;
        info.u_min = params.get_float(U_MIN, 0.0);
        info.u_max = params.get_float(U_MAX, PI);
        info.v_min = params.get_float(V_MIN, -PI);
        info.v_max = params.get_float(V_MAX, PI);
        info.inverse_normals = params.get_bool(INVERSE_NORMALS, false);
        info.rotate_polygons = params.get_bool(ROTATE_POLYGONS, true);
        info.flip_uv_x = params.get_bool(FLIP_UV_X, false);
        info.flip_uv_y = params.get_bool(FLIP_UV_Y, false);
        Ok(ExpressionData::default())
    }

    fn init_thread_activity(
        &self,
        params: &Params,
        _info: &ShapeInfo,
        data: &mut ExpressionData,
        workers: usize,
    ) -> Result<(), String> {
        let program = SurfaceProgram::compile(
            params.get_string(X_EXPR, DEFAULT_X),
            params.get_string(Y_EXPR, DEFAULT_Y),
            params.get_string(Z_EXPR, DEFAULT_Z),
            params.get_string(VARIABLES, ""),
        )?;
        data.programs = vec![program; workers.max(1)];
        tracing::debug!("expression compiled for {} workers", data.programs.len());
        Ok(())
    }

    fn free_thread_activity(&self, _params: &Params, _info: &ShapeInfo, data: &mut ExpressionData, _workers: usize) {
        data.programs.clear();
    }

    fn calc_point(&self, _info: &ShapeInfo, data: &ExpressionData, u: f32, v: f32, worker: usize) -> Vec3 {
        data.programs
            .get(worker)
            .map_or(Vec3::ZERO, |program| program.eval(u, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{GenerationContext, ThreadingConfig};
    use crate::error::GenerationError;
    use crate::object::PrimitiveObject;
    use crate::shape::{build_shape, ShapeGenerator, VSEGMENTS};

    fn expression_object(x: &str, y: &str, z: &str, variables: &str) -> PrimitiveObject {
        let mut object = PrimitiveObject::new(default_params(), param_specs());
        let edits = [
            (X_EXPR, x),
            (Y_EXPR, y),
            (Z_EXPR, z),
            (VARIABLES, variables),
        ];
        for (key, code) in edits {
            object.set_param(key, ParamValue::String(code.to_string())).unwrap();
        }
        object
    }

    #[test]
    fn reads_domain_and_flags_from_params() {
        let mut params = default_params();
        params.set(U_MAX, ParamValue::Float(2.0));
        params.set(INVERSE_NORMALS, ParamValue::Bool(true));
        params.set(ROTATE_POLYGONS, ParamValue::Bool(false));
        params.set(FLIP_UV_X, ParamValue::Bool(true));
        let mut info = ShapeInfo::default();
        let data = Expression.init_calculation(&params, &mut info).unwrap();
        assert_eq!(info.optimize_passes, 2);
        assert_eq!((info.u_min, info.u_max), (0.0, 2.0));
        assert_eq!((info.v_min, info.v_max), (-PI, PI));
        assert!(info.inverse_normals);
        assert!(!info.rotate_polygons);
        assert!(info.flip_uv_x);
        assert!(!info.flip_uv_y);
        assert_eq!(info.u_segments, 10);
        assert_eq!(data.worker_programs(), 0);
    }

    #[test]
    fn plane_formulas_lay_out_a_flat_grid() {
        let mut object = expression_object("u * s", "v * s", "0", "s = 10");
        for (key, value) in [(U_MIN, 0.0), (U_MAX, 1.0), (V_MIN, 0.0), (V_MAX, 1.0)] {
            object.set_param(key, ParamValue::Float(value)).unwrap();
        }
        object.set_param(USEGMENTS, ParamValue::Int(2)).unwrap();
        object.set_param(VSEGMENTS, ParamValue::Int(2)).unwrap();

        let (mesh, stats) = build_shape(&Expression, &object, 1, &GenerationContext::new()).unwrap();
        assert_eq!(mesh.point_count(), 9);
        assert_eq!(mesh.polygon_count(), 4);
        assert_eq!(stats.worker_count, 1);
        assert_eq!(mesh.points[0], Vec3::ZERO);
        assert_eq!(mesh.points[4], Vec3::new(5.0, 5.0, 0.0));
        assert_eq!(mesh.points[8], Vec3::new(10.0, 10.0, 0.0));
        assert!(mesh.points.iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn parse_errors_abort_in_thread_setup() {
        let object = expression_object("u *", "v", "0", "");
        let mut generator = ShapeGenerator::new(Expression);
        let err = generator
            .generate(&object, 1, &GenerationContext::new())
            .unwrap_err();
        match err {
            GenerationError::ThreadSetup(message) => assert!(message.starts_with("x:"), "{message}"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!generator.cache().is_computed());

        let object = expression_object("u", "v", "k", "k = nope");
        let err = build_shape(&Expression, &object, 1, &GenerationContext::new()).unwrap_err();
        assert!(matches!(err, GenerationError::ThreadSetup(_)));
    }

    #[test]
    fn non_finite_points_fall_back_to_the_origin() {
        let program = SurfaceProgram::compile("1 / u", "v", "0", "").unwrap();
        assert_eq!(program.eval(0.0, 3.0), Vec3::ZERO);
        assert_eq!(program.eval(2.0, 3.0), Vec3::new(0.5, 3.0, 0.0));
    }

    #[test]
    fn workers_agree_with_a_single_thread() {
        let mut object = expression_object("cos(u) * r", "sin(v) * r", "u * v", "r = 40");
        object.set_param(USEGMENTS, ParamValue::Int(200)).unwrap();
        object.set_param(VSEGMENTS, ParamValue::Int(150)).unwrap();
        let serial = GenerationContext::new().with_threading(ThreadingConfig {
            parallelism: Some(1),
            ..ThreadingConfig::default()
        });
        let parallel = GenerationContext::new().with_threading(ThreadingConfig {
            parallelism: Some(4),
            max_points_per_thread: 5_000,
            chunk_size: 1_000,
            ..ThreadingConfig::default()
        });

        let (a, a_stats) = build_shape(&Expression, &object, 1, &serial).unwrap();
        let (b, b_stats) = build_shape(&Expression, &object, 1, &parallel).unwrap();
        assert_eq!(a_stats.worker_count, 1);
        assert_eq!(b_stats.worker_count, 3);
        assert_eq!(a.points, b.points);
        assert_eq!(a.polygons, b.polygons);
    }
}
