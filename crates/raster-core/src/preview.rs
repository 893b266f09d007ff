//! Staging of interactive edits.
//!
//! A [`PreviewSession`] keeps the committed frame untouched while a drag or
//! rotation is in progress. Edits go to a scratch copy, which is either
//! committed (yielding a [`FrameDiff`]) or thrown away.

use std::fmt;

use glam::DVec2;
use serde::Serialize;

use crate::{RasterError, RasterFrame, Result, ScanType, Unit};

/// Logical fields of a frame that change notifications are emitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameField {
    Corners,
    Angle,
    Pitch,
    Offset,
    Conversion,
    Beamsize,
    Stepsize,
    Width,
    Height,
    ScanType,
}

impl FrameField {
    pub const ALL: [FrameField; 10] = [
        FrameField::Corners,
        FrameField::Angle,
        FrameField::Pitch,
        FrameField::Offset,
        FrameField::Conversion,
        FrameField::Beamsize,
        FrameField::Stepsize,
        FrameField::Width,
        FrameField::Height,
        FrameField::ScanType,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FrameField::Corners => "corners",
            FrameField::Angle => "angle",
            FrameField::Pitch => "pitch",
            FrameField::Offset => "offset",
            FrameField::Conversion => "conversion",
            FrameField::Beamsize => "beamsize",
            FrameField::Stepsize => "stepsize",
            FrameField::Width => "width",
            FrameField::Height => "height",
            FrameField::ScanType => "scan_type",
        }
    }
}

impl fmt::Display for FrameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value copy of the observable fields of a frame. Geometry is in pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub corners: [DVec2; 4],
    pub angle: f64,
    pub pitch: f64,
    pub offset: Option<DVec2>,
    pub conversion: f64,
    pub beamsize: DVec2,
    pub stepsize: DVec2,
    pub width: f64,
    pub height: f64,
    pub scan_type: ScanType,
}

impl FrameSnapshot {
    pub fn of(frame: &RasterFrame) -> Self {
        Self {
            corners: frame.corners(),
            angle: frame.angle(),
            pitch: frame.pitch(),
            offset: frame.offset(),
            conversion: frame.conversion(),
            beamsize: frame.beamsize(),
            stepsize: frame.stepsize(),
            width: frame.width(Unit::Pixel),
            height: frame.height(Unit::Pixel),
            scan_type: frame.scan_type(),
        }
    }

    fn differs(&self, other: &FrameSnapshot, field: FrameField) -> bool {
        match field {
            FrameField::Corners => self.corners != other.corners,
            FrameField::Angle => self.angle != other.angle,
            FrameField::Pitch => self.pitch != other.pitch,
            FrameField::Offset => self.offset != other.offset,
            FrameField::Conversion => self.conversion != other.conversion,
            FrameField::Beamsize => self.beamsize != other.beamsize,
            FrameField::Stepsize => self.stepsize != other.stepsize,
            FrameField::Width => self.width != other.width,
            FrameField::Height => self.height != other.height,
            FrameField::ScanType => self.scan_type != other.scan_type,
        }
    }
}

/// Receives one call per changed field when a [`FrameDiff`] is delivered.
pub trait FrameObserver {
    fn field_changed(&mut self, field: FrameField, snapshot: &FrameSnapshot);
}

/// Before and after state of a committed edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameDiff {
    pub before: FrameSnapshot,
    pub after: FrameSnapshot,
    /// Fields whose value differs, in [`FrameField::ALL`] order.
    pub changed: Vec<FrameField>,
}

impl FrameDiff {
    pub fn between(before: FrameSnapshot, after: FrameSnapshot) -> Self {
        let changed = FrameField::ALL
            .into_iter()
            .filter(|field| before.differs(&after, *field))
            .collect();
        Self {
            before,
            after,
            changed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn contains(&self, field: FrameField) -> bool {
        self.changed.contains(&field)
    }

    /// Forward the changed fields, and only those, to `observer`.
    pub fn notify(&self, observer: &mut impl FrameObserver) {
        for field in &self.changed {
            observer.field_changed(*field, &self.after);
        }
    }
}

/// A committed frame plus an optional scratch copy being edited.
#[derive(Debug, Clone, Default)]
pub struct PreviewSession {
    committed: RasterFrame,
    scratch: Option<RasterFrame>,
}

impl PreviewSession {
    pub fn new(frame: RasterFrame) -> Self {
        Self {
            committed: frame,
            scratch: None,
        }
    }

    /// The committed frame. Stays queryable while a preview is in progress.
    pub fn frame(&self) -> &RasterFrame {
        &self.committed
    }

    pub fn into_frame(self) -> RasterFrame {
        self.committed
    }

    pub fn is_active(&self) -> bool {
        self.scratch.is_some()
    }

    /// Start (or restart) a preview from the committed frame.
    ///
    /// Calling this again mid-preview throws the pending edits away, which is
    /// what a pointer-move handler replaying a drag from its origin wants.
    pub fn begin(&mut self) -> &mut RasterFrame {
        self.scratch.insert(self.committed.clone())
    }

    pub fn scratch(&self) -> Option<&RasterFrame> {
        self.scratch.as_ref()
    }

    pub fn scratch_mut(&mut self) -> Option<&mut RasterFrame> {
        self.scratch.as_mut()
    }

    /// Replace the committed frame with the scratch copy.
    ///
    /// Returns `None` when no preview is in progress.
    pub fn commit(&mut self) -> Option<FrameDiff> {
        let scratch = self.scratch.take()?;
        let before = FrameSnapshot::of(&self.committed);
        self.committed = scratch;
        let diff = FrameDiff::between(before, FrameSnapshot::of(&self.committed));
        log::debug!("Committed preview, changed fields: {:?}", diff.changed);
        Some(diff)
    }

    /// Drop the scratch copy. Returns whether there was one.
    pub fn discard(&mut self) -> bool {
        self.scratch.take().is_some()
    }

    /// Edit the committed frame directly and report what changed.
    pub fn apply(&mut self, edit: impl FnOnce(&mut RasterFrame)) -> Result<FrameDiff> {
        if self.is_active() {
            return Err(RasterError::PreviewActive);
        }
        let before = FrameSnapshot::of(&self.committed);
        edit(&mut self.committed);
        Ok(FrameDiff::between(before, FrameSnapshot::of(&self.committed)))
    }
}
