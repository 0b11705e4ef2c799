#[cfg(not(target_arch = "wasm32"))]
use std::process;

#[cfg(not(target_arch = "wasm32"))]
mod headless;
#[cfg(not(target_arch = "wasm32"))]
mod logging;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    let args: Vec<String> = std::env::args().collect();
    let level = match logging::level_from_args(&args) {
        Ok(level) => level,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };
    logging::setup_tracing(level);

    tracing::info!("pr1mitive starting");

    if let Err(err) = headless::run(&args) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
