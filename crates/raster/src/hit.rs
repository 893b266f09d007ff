use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use glam::DVec2;

#[derive(Args, Debug)]
#[command(about = "Classify a pixel position against a raster (corner, edge, inside or outside)")]
pub struct HitArgs {
    /// Raster configuration (TOML)
    #[arg(value_name = "CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Horizontal pixel coordinate
    #[arg(long, allow_negative_numbers = true)]
    pub x: f64,

    /// Vertical pixel coordinate
    #[arg(long, allow_negative_numbers = true)]
    pub y: f64,

    /// Hit distance in pixels
    #[arg(short, long, default_value_t = 5.0)]
    pub tolerance: f64,
}

pub fn execute(args: HitArgs) -> Result<()> {
    let frame = crate::load_frame(&args.config)?;
    let relation = frame.point_relation(DVec2::new(args.x, args.y), args.tolerance);
    println!("{relation}");
    Ok(())
}
