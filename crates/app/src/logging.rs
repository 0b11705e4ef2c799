use std::io;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

pub(crate) const DEFAULT_LEVEL: LevelFilter = LevelFilter::INFO;

pub(crate) fn parse_level(text: &str) -> Result<LevelFilter, String> {
    match text.trim().to_ascii_lowercase().as_str() {
        "off" => Ok(LevelFilter::OFF),
        "error" => Ok(LevelFilter::ERROR),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "info" => Ok(LevelFilter::INFO),
        "debug" => Ok(LevelFilter::DEBUG),
        "trace" => Ok(LevelFilter::TRACE),
        other => Err(format!("unknown log level '{other}'")),
    }
}

/// Reads `--log-level <lvl>` from the command line, defaulting to info.
pub(crate) fn level_from_args(args: &[String]) -> Result<LevelFilter, String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--log-level" {
            let value = iter
                .next()
                .ok_or_else(|| "--log-level requires a value".to_string())?;
            return parse_level(value);
        }
    }
    Ok(DEFAULT_LEVEL)
}

/// Installs a stderr fmt subscriber. Our own crates log at `level`,
/// dependencies only at warn and above.
pub(crate) fn setup_tracing(level: LevelFilter) {
    let filter_layer = tracing_subscriber::filter::filter_fn(move |metadata| {
        let own = metadata.target().starts_with("pr1mitive");
        let effective = if own {
            level
        } else {
            level.min(LevelFilter::WARN)
        };
        effective >= *metadata.level()
    });
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter_layer))
        .init();
}
