use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use raster_core::config::RasterConfig;
use raster_core::RasterFrame;

mod hit;
mod info;
mod plan;

#[derive(Parser)]
#[command(name = "raster")]
#[command(about = "Plan and inspect raster scans", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the scan positions of a raster
    #[command(alias = "p")]
    Plan(plan::PlanArgs),

    /// Display raster geometry and grid information
    Info(info::InfoArgs),

    /// Classify a pixel position against a raster
    Hit(hit::HitArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug, RUST_LOG still wins
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Plan(args) => plan::execute(args),
        Commands::Info(args) => info::execute(args),
        Commands::Hit(args) => hit::execute(args),
    }
}

/// Read a raster configuration file and build its frame.
pub(crate) fn load_frame(path: &Path) -> anyhow::Result<RasterFrame> {
    let config = RasterConfig::from_path(path)
        .with_context(|| format!("Failed to load raster config {}", path.display()))?;
    let frame = config
        .build_frame()
        .with_context(|| format!("Invalid raster config {}", path.display()))?;
    log::debug!("Loaded raster from {}", path.display());
    Ok(frame)
}
