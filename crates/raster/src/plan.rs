use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::Table;
use glam::DVec2;
use raster_core::{RasterFrame, ScanType};
use serde::Serialize;

#[derive(ValueEnum, Debug, Clone, Default)]
pub enum PlanFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for PlanFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanFormat::Table => write!(f, "table"),
            PlanFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Args, Debug, Clone)]
#[command(about = "Print the physical scan positions of a raster, line by line")]
pub struct PlanArgs {
    /// Raster configuration (TOML)
    #[arg(value_name = "CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, default_value_t = PlanFormat::Table)]
    pub format: PlanFormat,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    scan_type: ScanType,
    /// Length of the visiting path, including a bidirectional return.
    points: usize,
    rows: Vec<Vec<DVec2>>,
}

pub fn execute(args: PlanArgs) -> Result<()> {
    let frame = crate::load_frame(&args.config)?;
    if frame.offset().is_none() {
        bail!("Cannot report physical positions: `offset` is not set");
    }
    if frame.pixmap_center().is_none() {
        bail!("Cannot report physical positions: `pixmap_size` is not set");
    }

    let rows = frame.scan_rows();
    if rows.is_empty() {
        log::warn!("Raster does not contain any scan positions");
    }

    let mut writer = io::stdout().lock();
    match args.format {
        PlanFormat::Json => {
            let output = PlanOutput {
                scan_type: frame.scan_type(),
                points: frame.scan_positions().len(),
                rows,
            };
            writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        PlanFormat::Table => write_plan_table(&frame, &rows, writer)?,
    }

    Ok(())
}

fn write_plan_table<W: Write>(frame: &RasterFrame, rows: &[Vec<DVec2>], mut writer: W) -> io::Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Line", "Point", "X", "Y"]);

    let mut index = 0;
    for (line, row) in rows.iter().enumerate() {
        for position in row {
            table.add_row(vec![
                line.to_string(),
                index.to_string(),
                format!("{:.3}", position.x),
                format!("{:.3}", position.y),
            ]);
            index += 1;
        }
    }

    writeln!(writer, "{table}")?;
    writeln!(writer, "{index} points, scan type {}", frame.scan_type())?;
    Ok(())
}
