//! TOML description of a raster and its scan settings.
//!
//! ```toml
//! conversion = 2.182      # pixels per µm
//! stepsize = [13.0, 13.0]
//! beamsize = [10.0, 10.0]
//! offset = [1500.0, -320.0]
//! pixmap_size = [1280.0, 1024.0]
//! scan_type = ["snake"]
//!
//! [geometry]
//! unit = "physical"
//! top_left = [20.0, 20.0]
//! bottom_right = [80.0, 50.0]
//! angle = 5.0
//! ```

use std::path::{Path, PathBuf};

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Corner, RasterError, RasterFrame, ScanType, Unit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RasterConfig {
    /// Pixels per physical unit.
    pub conversion: f64,
    /// Out-of-plane tilt in degrees.
    #[serde(default)]
    pub pitch: f64,
    pub stepsize: DVec2,
    pub beamsize: DVec2,
    #[serde(default)]
    pub offset: Option<DVec2>,
    #[serde(default)]
    pub pixmap_size: Option<DVec2>,
    #[serde(default)]
    pub scan_type: ScanType,
    #[serde(default)]
    pub geometry: Option<GeometryConfig>,
}

/// Initial placement of the raster rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeometryConfig {
    #[serde(default)]
    pub unit: Unit,
    pub top_left: DVec2,
    pub bottom_right: DVec2,
    #[serde(default)]
    pub angle: f64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("Geometry is given in physical units but conversion is 0")]
    UnsetConversion,
}

impl RasterConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Build a frame through the validating setters.
    pub fn build_frame(&self) -> Result<RasterFrame, ConfigError> {
        let mut frame = RasterFrame::new();
        frame.set_conversion(self.conversion)?;
        frame.set_pitch(self.pitch)?;
        frame.set_stepsize(self.stepsize)?;
        frame.set_beamsize(self.beamsize)?;
        if let Some(offset) = self.offset {
            frame.set_offset(offset)?;
        }
        if let Some(size) = self.pixmap_size {
            frame.set_pixmap_size(size)?;
        }
        frame.set_scan_type(self.scan_type);

        if let Some(geometry) = &self.geometry {
            if geometry.unit == Unit::Physical && self.conversion == 0.0 {
                return Err(ConfigError::UnsetConversion);
            }
            frame.set_all_corners(geometry.top_left, geometry.unit);
            frame.set_corner(geometry.bottom_right, Corner::TopLeft, geometry.unit);
            frame.set_angle(geometry.angle);
        }
        log::debug!(
            "Built {}x{} px raster frame ({})",
            frame.width(Unit::Pixel),
            frame.height(Unit::Pixel),
            frame.scan_type()
        );
        Ok(frame)
    }
}
