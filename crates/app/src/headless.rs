use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use pr1mitive_core::{
    save_obj, GenerationContext, ParamId, ParamValue, Params, Primitive, PrimitiveKind, RunStats,
    ThreadingConfig,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct RunPlan {
    #[serde(default = "default_primitive")]
    primitive: String,
    #[serde(default)]
    params: BTreeMap<ParamId, ParamValue>,
    #[serde(default)]
    threading: ThreadingConfig,
    #[serde(default = "default_repeat")]
    repeat: u32,
}

#[derive(Debug, Default)]
struct DriverArgs {
    plan_path: Option<PathBuf>,
    out_path: Option<PathBuf>,
    primitive: Option<String>,
    print: bool,
    list: bool,
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    primitive: &'a str,
    runs: u32,
    rebuilds: u32,
    point_count: usize,
    stats: Option<RunStats>,
    status: &'a str,
}

pub fn run(args: &[String]) -> Result<(), String> {
    let parsed = parse_args(args)?;
    if parsed.list {
        print_primitives();
        return Ok(());
    }

    let mut plan = match &parsed.plan_path {
        Some(path) => load_plan(path)?,
        None => default_plan(),
    };
    if let Some(name) = parsed.primitive {
        plan.primitive = name;
    }

    let mut primitive = Primitive::from_name(&plan.primitive).map_err(|err| err.to_string())?;
    let edited = primitive.object_mut().set_params(&Params {
        values: plan.params,
    })?;
    tracing::info!("driver: {} with {} edited parameters", primitive.kind(), edited);

    let ctx = GenerationContext::new()
        .with_threading(plan.threading)
        .with_update_sink(Arc::new(|update| {
            tracing::debug!(
                "driver: {:?} update #{} ({} points)",
                update.kind,
                update.update_count,
                update.point_count
            );
        }));

    let runs = plan.repeat.max(1);
    let mut rebuilds = 0;
    let mut last_stats = None;
    for run in 0..runs {
        let generation = primitive.generate(&ctx).map_err(|err| err.to_string())?;
        match generation.stats() {
            Some(stats) => {
                rebuilds += 1;
                last_stats = Some(*stats);
            }
            None => tracing::info!("driver: run {} unchanged", run + 1),
        }
    }
    let artifact = primitive
        .current()
        .ok_or_else(|| "nothing was generated".to_string())?;

    if let Some(path) = &parsed.out_path {
        save_obj(path, artifact).map_err(|err| err.to_string())?;
    }

    if parsed.print {
        let kind = primitive.kind();
        let report = RunReport {
            primitive: kind.name(),
            runs,
            rebuilds,
            point_count: artifact.point_count(),
            stats: last_stats,
            status: primitive.object().params().get_string(kind.status_param(), ""),
        };
        let json = serde_json::to_string_pretty(&report).map_err(|err| err.to_string())?;
        println!("{json}");
    }

    tracing::info!("driver: completed");
    Ok(())
}

fn parse_args(args: &[String]) -> Result<DriverArgs, String> {
    let mut parsed = DriverArgs::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--plan" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--plan requires a path".to_string())?;
                parsed.plan_path = Some(PathBuf::from(value));
            }
            "--out" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--out requires a path".to_string())?;
                parsed.out_path = Some(PathBuf::from(value));
            }
            "--primitive" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--primitive requires a name".to_string())?;
                parsed.primitive = Some(value.clone());
            }
            // Consumed by the logging setup.
            "--log-level" => {
                iter.next();
            }
            "--print" => parsed.print = true,
            "--list" => parsed.list = true,
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }

    Ok(parsed)
}

fn print_help() {
    println!(
        "Usage: pr1mitive [options]\n  --plan <path>        JSON run plan\n  --primitive <name>   override the plan's primitive\n  --out <path.obj>     write the result as OBJ\n  --print              print run stats as JSON\n  --list               list primitives and their parameters\n  --log-level <lvl>    off, error, warn, info, debug or trace"
    );
}

fn print_primitives() {
    for kind in PrimitiveKind::ALL {
        let label = if kind.is_spline() { "spline" } else { "surface" };
        println!("{} ({label})", kind.name());
        for spec in kind.param_specs() {
            let default = kind
                .default_params()
                .get(spec.key)
                .map(|value| format!("{value:?}"))
                .unwrap_or_default();
            println!("  {:>5}  {:<22} {}", spec.key.value(), spec.label, default);
        }
    }
}

fn load_plan(path: &Path) -> Result<RunPlan, String> {
    let data = std::fs::read(path).map_err(|err| format!("{}: {err}", path.display()))?;
    parse_plan(&data)
}

fn parse_plan(data: &[u8]) -> Result<RunPlan, String> {
    serde_json::from_slice(data).map_err(|err| err.to_string())
}

fn default_plan() -> RunPlan {
    RunPlan {
        primitive: default_primitive(),
        params: BTreeMap::new(),
        threading: ThreadingConfig::default(),
        repeat: default_repeat(),
    }
}

fn default_primitive() -> String {
    PrimitiveKind::Teardrop.name().to_string()
}

fn default_repeat() -> u32 {
    1
}
