//! Raster geometry and scan-pattern generation.
//!
//! A [`RasterFrame`] positions a grid-snapped rectangle over a camera image and
//! derives the ordered list of scan positions inside it, honoring the beam
//! footprint, the step pitch and the selected [`ScanType`]. Interactive edits go
//! through a [`PreviewSession`], which stages changes on a scratch copy and
//! reports which fields changed when they are committed.
//!
//! The crate only computes geometry. It never talks to motors or cameras.

pub mod config;
mod frame;
pub mod geometry;
mod positions;
pub mod preview;
mod relation;
mod scan_type;

pub use frame::RasterFrame;
pub use geometry::{Amount, Corner, Edge, PointRelation, Rotation, Unit};
pub use positions::{ScanGrid, MAX_SCAN_POINTS};
pub use preview::{FrameDiff, FrameField, FrameObserver, FrameSnapshot, PreviewSession};
pub use scan_type::ScanType;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RasterError {
    #[error("Invalid scan type {0}: only bits 0-5 are defined")]
    InvalidScanType(u32),

    #[error("Unknown scan type flag '{0}'")]
    UnknownScanFlag(String),

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("A preview session is in progress; commit or discard it first")]
    PreviewActive,
}

pub type Result<T> = std::result::Result<T, RasterError>;
