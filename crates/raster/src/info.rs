use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use glam::DVec2;
use raster_core::{Corner, RasterFrame, ScanType, Unit};
use serde::Serialize;

#[derive(Args, Debug)]
#[command(about = "Display raster geometry and grid information")]
pub struct InfoArgs {
    /// Raster configuration (TOML)
    #[arg(value_name = "CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "human")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[derive(Debug, Serialize)]
struct RasterInfo {
    width: f64,
    height: f64,
    width_px: f64,
    height_px: f64,
    angle: f64,
    center_px: DVec2,
    corners_px: [DVec2; 4],
    scan_type: ScanType,
    columns: usize,
    lines: usize,
    points: usize,
}

impl RasterInfo {
    fn of(frame: &RasterFrame) -> Self {
        let (columns, lines) = frame.scan_counts();
        Self {
            width: frame.width(Unit::Physical),
            height: frame.height(Unit::Physical),
            width_px: frame.width(Unit::Pixel),
            height_px: frame.height(Unit::Pixel),
            angle: frame.angle(),
            center_px: frame.center(Unit::Pixel),
            corners_px: frame.corners(),
            scan_type: frame.scan_type(),
            columns,
            lines,
            points: frame.pixel_positions().len(),
        }
    }
}

pub fn execute(args: InfoArgs) -> Result<()> {
    let frame = crate::load_frame(&args.config)?;
    let info = RasterInfo::of(&frame);
    match args.format {
        OutputFormat::Human => print_human_readable(&info),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
    }
    Ok(())
}

fn print_human_readable(info: &RasterInfo) {
    println!("{}", "Raster".blue().bold());
    println!(
        "Size: {:.3} x {:.3} ({:.1} x {:.1} px)",
        info.width, info.height, info.width_px, info.height_px
    );
    println!("Angle: {:.3}°", info.angle);
    println!("Center: ({:.1}, {:.1}) px", info.center_px.x, info.center_px.y);
    for (corner, position) in Corner::ALL.iter().zip(info.corners_px) {
        println!("  {corner}: ({:.1}, {:.1})", position.x, position.y);
    }

    println!();
    println!("{}", "Scan".blue().bold());
    println!("Type: {}", info.scan_type.to_string().cyan());
    println!("Grid: {} x {}", info.columns, info.lines);
    println!("Points: {}", info.points);
}
