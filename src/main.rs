//! Command line entry point: compute walksheds for every point and distance
//! listed in a TOML configuration file.

use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkshed_core::prelude::*;

/// Compute the road network reachable on foot from points of interest.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML configuration file. Relative paths inside it are resolved
    /// against the file's directory.
    #[arg(short, long, default_value = "walkshed.toml")]
    config: PathBuf,

    /// Walking distances overriding the configured ones (e.g. "400,800")
    #[arg(short, long, value_delimiter = ',')]
    distances: Option<Vec<f64>>,

    /// Worker threads; defaults to one per core
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

fn load_config(path: &Path) -> Result<WalkshedConfig, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("cannot read config {}: {err}", path.display()))?;
    let config: WalkshedConfig = toml::from_str(&text)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(config.relative_to(base))
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let mut config = load_config(&args.config)?;
    if let Some(distances) = args.distances {
        config.distances = distances;
    }
    info!(
        "Loaded config {} with {} distances",
        args.config.display(),
        config.distances.len()
    );

    let inputs = load_inputs(&config)?;
    let report = run_walksheds(&inputs, &config.distances, &config.options());

    for (result, dropped) in report.dropped() {
        warn!(
            "{}: segment {} dropped at {} m: {}",
            result.point_name, dropped.segment, result.max_distance, dropped.reason
        );
    }
    if !report.skipped.is_empty() {
        warn!("{} point/distance pairs were skipped", report.skipped.len());
    }

    let files = write_outputs(&report, &config)?;
    info!(
        "Wrote {} walkshed files to {}",
        files.collections.len(),
        config.output_dir.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
