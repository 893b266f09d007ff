use std::cell::{Ref, RefCell};

use glam::{DMat2, DVec2};

use crate::geometry::{perpendicular, snap_extent, unit_x_for_angle};
use crate::positions::{self, GridLayout, ScanGrid};
use crate::{Amount, Corner, Edge, RasterError, Result, Rotation, ScanType, Unit};

const HALF_SQRT_3: f64 = 0.866_025_403_784_438_6;

/// Edges shorter than this are treated as collapsed when rebuilding unit vectors.
const MIN_EDGE_PX: f64 = 1e-9;

/// Corner slots receiving the four points computed by [`RasterFrame::set_corner`].
///
/// Indexed by the quadrant the dragged corner lands in relative to the anchor,
/// measured in the frame's local axes: 0 = right/below, 1 = left/below,
/// 2 = left/above, 3 = right/above. Columns are
/// `[anchor, dragged corner, anchor + x leg, anchor + y leg]`.
/// The anchor of quadrant `q` lands in slot `q`, so the quadrant the drag
/// started in is the index of the kept corner.
const QUADRANT_SLOTS: [[Corner; 4]; 4] = [
    [
        Corner::TopLeft,
        Corner::BottomRight,
        Corner::TopRight,
        Corner::BottomLeft,
    ],
    [
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::TopLeft,
        Corner::BottomRight,
    ],
    [
        Corner::BottomRight,
        Corner::TopLeft,
        Corner::BottomLeft,
        Corner::TopRight,
    ],
    [
        Corner::BottomLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::TopLeft,
    ],
];

fn drag_quadrant(local: DVec2) -> usize {
    match (local.x < 0.0, local.y < 0.0) {
        (false, false) => 0,
        (true, false) => 1,
        (true, true) => 2,
        (false, true) => 3,
    }
}

/// Signed angle in degrees between `pivot → from` and `pivot → to`,
/// counter-clockwise on screen.
fn drag_angle(pivot: DVec2, from: DVec2, to: DVec2) -> f64 {
    let from_angle = (pivot.y - from.y).atan2(pivot.x - from.x);
    let to_angle = (pivot.y - to.y).atan2(pivot.x - to.x);
    (from_angle - to_angle).to_degrees()
}

fn finite(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RasterError::NonFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64> {
    if finite(field, value)? < 0.0 {
        return Err(RasterError::Negative { field, value });
    }
    Ok(value)
}

#[derive(Debug, Clone, Default)]
struct PositionCache {
    valid: bool,
    grid: ScanGrid,
}

/// A grid-snapped, rotatable rectangle over the camera image together with
/// the scan configuration used to fill it with positions.
///
/// All geometry is stored in pixels. The corners, the center, the angle and
/// the unit vectors are only ever updated together, and every mutation marks
/// the cached scan positions invalid.
#[derive(Debug, Clone)]
pub struct RasterFrame {
    pub(crate) corners: [DVec2; 4],
    pub(crate) center: DVec2,
    pub(crate) angle: f64,
    pub(crate) unit_x: DVec2,
    pub(crate) unit_y: DVec2,
    pub(crate) placed: bool,
    pitch: f64,
    pitch_factor: f64,
    stepsize: DVec2,
    beamsize: DVec2,
    conversion: f64,
    offset: Option<DVec2>,
    pixmap_center: Option<DVec2>,
    scan_type: ScanType,
    cache: RefCell<PositionCache>,
}

impl Default for RasterFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterFrame {
    /// An unplaced frame with no scan configuration.
    pub fn new() -> Self {
        Self {
            corners: [DVec2::ZERO; 4],
            center: DVec2::ZERO,
            angle: 0.0,
            unit_x: DVec2::X,
            unit_y: DVec2::Y,
            placed: false,
            pitch: 0.0,
            pitch_factor: 1.0,
            stepsize: DVec2::ZERO,
            beamsize: DVec2::ZERO,
            conversion: 0.0,
            offset: None,
            pixmap_center: None,
            scan_type: ScanType::empty(),
            cache: RefCell::new(PositionCache::default()),
        }
    }

    /// Reset the geometry to a zero-area rectangle at the origin.
    ///
    /// The scan configuration is kept.
    pub fn clear(&mut self) {
        self.corners = [DVec2::ZERO; 4];
        self.center = DVec2::ZERO;
        self.angle = 0.0;
        self.unit_x = DVec2::X;
        self.unit_y = DVec2::Y;
        self.placed = false;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.cache.get_mut().valid = false;
    }

    fn to_pixels(&self, value: DVec2, unit: Unit) -> Option<DVec2> {
        match unit {
            Unit::Pixel => Some(value),
            Unit::Physical if self.conversion == 0.0 => None,
            Unit::Physical => Some(value * self.conversion),
        }
    }

    fn from_pixels(&self, value: DVec2, unit: Unit) -> DVec2 {
        match unit {
            Unit::Pixel => value,
            Unit::Physical if self.conversion == 0.0 => DVec2::ZERO,
            Unit::Physical => value / self.conversion,
        }
    }

    fn length_from_pixels(&self, value: f64, unit: Unit) -> f64 {
        self.from_pixels(DVec2::new(value, 0.0), unit).x
    }

    /// Pixel step between neighbouring scan points along the local axes.
    pub(crate) fn pixel_steps(&self) -> DVec2 {
        let conversion = self.conversion;
        let horizontal = self.stepsize.x;
        if self.scan_type.contains(ScanType::TRIANGULAR) {
            if self.scan_type.contains(ScanType::VERTICAL) {
                DVec2::new(
                    conversion * HALF_SQRT_3 * horizontal,
                    conversion * horizontal * self.pitch_factor,
                )
            } else {
                DVec2::new(
                    conversion * horizontal,
                    conversion * HALF_SQRT_3 * horizontal * self.pitch_factor,
                )
            }
        } else {
            DVec2::new(
                conversion * horizontal,
                conversion * self.pitch_factor * self.stepsize.y,
            )
        }
    }

    fn beam_pixels(&self) -> DVec2 {
        self.beamsize * self.conversion
    }

    fn width_px(&self) -> f64 {
        self.corners[1].distance(self.corners[0])
    }

    fn height_px(&self) -> f64 {
        self.corners[3].distance(self.corners[0])
    }

    // Geometry mutators

    /// Move one corner to `point` while `kept`, the diagonally opposite
    /// corner, stays fixed. Width and height are snapped to the scan grid.
    ///
    /// Dragging past the anchor relabels the corners so that `TopLeft` keeps
    /// denoting the upper left corner in the frame's local axes.
    pub fn set_corner(&mut self, point: DVec2, kept: Corner, unit: Unit) {
        let Some(point) = self.to_pixels(point, unit) else {
            log::debug!("Ignoring corner update: conversion factor is not set");
            return;
        };
        let anchor = self.corners[kept.index()];
        if !self.placed || point == anchor {
            self.set_all_corners(point, Unit::Pixel);
            return;
        }

        let drag = point - anchor;
        let local = DVec2::new(drag.dot(self.unit_x), drag.dot(self.unit_y));
        if !local.is_finite() {
            log::debug!("Ignoring corner update with non-finite drag {drag:?}");
            return;
        }

        let steps = self.pixel_steps();
        let beam = self.beam_pixels();
        let width = snap_extent(local.x.abs(), beam.x, steps.x);
        let height = snap_extent(local.y.abs(), beam.y, steps.y);

        let quadrant = drag_quadrant(local);
        if quadrant != kept.index() {
            log::debug!("Corner dragged across the {kept} anchor, relabeling corners");
        }

        let leg_x = self.unit_x * if local.x < 0.0 { -width } else { width };
        let leg_y = self.unit_y * if local.y < 0.0 { -height } else { height };
        let computed = [anchor, anchor + leg_x + leg_y, anchor + leg_x, anchor + leg_y];
        for (slot, corner) in QUADRANT_SLOTS[quadrant].iter().zip(computed) {
            self.corners[slot.index()] = corner;
        }
        self.center = anchor + (leg_x + leg_y) * 0.5;
        self.invalidate();
    }

    pub fn set_top_left(&mut self, point: DVec2, unit: Unit) {
        self.set_corner(point, Corner::BottomRight, unit);
    }

    pub fn set_top_right(&mut self, point: DVec2, unit: Unit) {
        self.set_corner(point, Corner::BottomLeft, unit);
    }

    pub fn set_bottom_right(&mut self, point: DVec2, unit: Unit) {
        self.set_corner(point, Corner::TopLeft, unit);
    }

    pub fn set_bottom_left(&mut self, point: DVec2, unit: Unit) {
        self.set_corner(point, Corner::TopRight, unit);
    }

    /// Collapse the frame to zero area at `point`, seeding a new rectangle.
    pub fn set_all_corners(&mut self, point: DVec2, unit: Unit) {
        let Some(point) = self.to_pixels(point, unit) else {
            log::debug!("Ignoring seed point: conversion factor is not set");
            return;
        };
        self.corners = [point; 4];
        self.center = point;
        self.unit_x = unit_x_for_angle(self.angle);
        self.unit_y = perpendicular(self.unit_x);
        self.placed = true;
        self.invalidate();
    }

    /// Push `edge` outwards by `amount`, snapping the resulting extent to the
    /// scan grid. Negative amounts pull the edge inwards; pulling it past the
    /// opposite edge swaps the corner labels of both edges.
    pub fn expand(&mut self, edge: Edge, amount: Amount, unit: Unit) {
        let amount = match unit {
            Unit::Pixel => amount,
            Unit::Physical if self.conversion == 0.0 => {
                log::debug!("Ignoring {edge} expansion: conversion factor is not set");
                return;
            }
            Unit::Physical => amount.scaled(self.conversion),
        };

        let steps = self.pixel_steps();
        let beam = self.beam_pixels();
        let (outward, extent, beam, step) = match edge {
            Edge::Left => (-self.unit_x, self.width_px(), beam.x, steps.x),
            Edge::Right => (self.unit_x, self.width_px(), beam.x, steps.x),
            Edge::Top => (-self.unit_y, self.height_px(), beam.y, steps.y),
            Edge::Bottom => (self.unit_y, self.height_px(), beam.y, steps.y),
        };
        let growth = amount.along(outward);
        if !growth.is_finite() {
            log::debug!("Ignoring non-finite {edge} expansion");
            return;
        }

        let target = extent + growth;
        let snapped = snap_extent(target.abs(), beam, step);
        let signed = if target < 0.0 { -snapped } else { snapped };

        // (moving, fixed) corner pairs: each moving corner sits `extent` away
        // from its fixed partner along `outward`.
        let pairs = match edge {
            Edge::Right => [
                (Corner::TopRight, Corner::TopLeft),
                (Corner::BottomRight, Corner::BottomLeft),
            ],
            Edge::Left => [
                (Corner::TopLeft, Corner::TopRight),
                (Corner::BottomLeft, Corner::BottomRight),
            ],
            Edge::Top => [
                (Corner::TopLeft, Corner::BottomLeft),
                (Corner::TopRight, Corner::BottomRight),
            ],
            Edge::Bottom => [
                (Corner::BottomLeft, Corner::TopLeft),
                (Corner::BottomRight, Corner::TopRight),
            ],
        };
        for (moving, fixed) in pairs {
            self.corners[moving.index()] = self.corners[fixed.index()] + outward * signed;
        }
        if signed < 0.0 {
            log::debug!("{edge} edge pulled past its opposite edge, swapping corner labels");
            for (moving, fixed) in pairs {
                self.corners.swap(moving.index(), fixed.index());
            }
        }

        self.center = (self.corners[0] + self.corners[2]) * 0.5;
        self.placed = true;
        self.invalidate();
    }

    pub fn expand_left(&mut self, amount: Amount, unit: Unit) {
        self.expand(Edge::Left, amount, unit);
    }

    pub fn expand_right(&mut self, amount: Amount, unit: Unit) {
        self.expand(Edge::Right, amount, unit);
    }

    pub fn expand_top(&mut self, amount: Amount, unit: Unit) {
        self.expand(Edge::Top, amount, unit);
    }

    pub fn expand_bottom(&mut self, amount: Amount, unit: Unit) {
        self.expand(Edge::Bottom, amount, unit);
    }

    /// Resize horizontally around the center.
    pub fn set_width(&mut self, width: f64, unit: Unit) {
        let Some(target) = self.to_pixels(DVec2::new(width, 0.0), unit).map(|v| v.x) else {
            return;
        };
        if !(target.is_finite() && target >= 0.0) {
            log::debug!("Ignoring invalid width {width}");
            return;
        }
        let grow = (target - self.width_px()) * 0.5;
        self.expand(Edge::Left, Amount::Scalar(grow), Unit::Pixel);
        let rest = target - self.width_px();
        self.expand(Edge::Right, Amount::Scalar(rest), Unit::Pixel);
    }

    /// Resize vertically around the center.
    pub fn set_height(&mut self, height: f64, unit: Unit) {
        let Some(target) = self.to_pixels(DVec2::new(height, 0.0), unit).map(|v| v.x) else {
            return;
        };
        if !(target.is_finite() && target >= 0.0) {
            log::debug!("Ignoring invalid height {height}");
            return;
        }
        let grow = (target - self.height_px()) * 0.5;
        self.expand(Edge::Top, Amount::Scalar(grow), Unit::Pixel);
        let rest = target - self.height_px();
        self.expand(Edge::Bottom, Amount::Scalar(rest), Unit::Pixel);
    }

    /// Translate the whole frame.
    ///
    /// With `keep_physical_position` the offset absorbs the movement, so the
    /// reported physical scan positions stay where they were.
    pub fn move_by(&mut self, distance: DVec2, unit: Unit, keep_physical_position: bool) {
        let Some(shift) = self.to_pixels(distance, unit) else {
            log::debug!("Ignoring move: conversion factor is not set");
            return;
        };
        if !shift.is_finite() {
            return;
        }
        if keep_physical_position && self.conversion != 0.0 {
            if let Some(offset) = self.offset.as_mut() {
                *offset -= shift / self.conversion;
            }
        }
        for corner in &mut self.corners {
            *corner += shift;
        }
        self.center += shift;
        self.invalidate();
    }

    /// Rotate around `anchor` (the center if `None`).
    ///
    /// The stored angle is reduced into `(-45°, 45°]`; each 90° boundary
    /// crossed shifts the corner labels by one slot so that `TopLeft` stays
    /// the corner nearest the upper left of the image.
    pub fn rotate(&mut self, rotation: Rotation, anchor: Option<DVec2>, unit: Unit) {
        let pivot = match anchor {
            None => self.center,
            Some(anchor) => match self.to_pixels(anchor, unit) {
                Some(anchor) => anchor,
                None => {
                    log::debug!("Ignoring rotation: conversion factor is not set");
                    return;
                }
            },
        };
        let delta = match rotation {
            Rotation::Degrees(degrees) => degrees,
            Rotation::Drag { from, to } => {
                let (Some(from), Some(to)) = (self.to_pixels(from, unit), self.to_pixels(to, unit))
                else {
                    return;
                };
                drag_angle(pivot, from, to)
            }
        };
        if !delta.is_finite() || !pivot.is_finite() {
            log::debug!("Ignoring non-finite rotation");
            return;
        }

        let delta = delta.rem_euclid(360.0);
        let total = self.angle + delta;
        let mut turns = ((total - 45.0) / 90.0).ceil();
        let mut angle = total - 90.0 * turns;
        if angle <= -45.0 {
            angle += 90.0;
            turns -= 1.0;
        } else if angle > 45.0 {
            angle -= 90.0;
            turns += 1.0;
        }
        let shift = (turns as i64).rem_euclid(4) as usize;

        let (sin, cos) = delta.to_radians().sin_cos();
        let matrix = DMat2::from_cols(DVec2::new(cos, -sin), DVec2::new(sin, cos));
        let rotated = self.corners.map(|corner| pivot + matrix * (corner - pivot));
        for slot in 0..4 {
            self.corners[slot] = rotated[(slot + shift) % 4];
        }
        self.center = pivot + matrix * (self.center - pivot);
        self.angle = angle;

        let top_edge = self.corners[1] - self.corners[0];
        let length = top_edge.length();
        self.unit_x = if length > MIN_EDGE_PX {
            top_edge / length
        } else {
            unit_x_for_angle(angle)
        };
        self.unit_y = perpendicular(self.unit_x);
        self.invalidate();
    }

    /// Set the absolute angle by rotating around the center.
    pub fn set_angle(&mut self, angle: f64) {
        if !angle.is_finite() {
            log::debug!("Ignoring non-finite angle");
            return;
        }
        self.rotate(Rotation::Degrees(angle - self.angle), None, Unit::Pixel);
    }

    /// Scale the geometry around the pixmap center. The conversion factor is
    /// left alone; keeping units consistent is up to the caller.
    pub fn scale(&mut self, factor: f64) {
        let Some(origin) = self.pixmap_center else {
            log::debug!("Ignoring scale: pixmap size is not set");
            return;
        };
        if !self.placed || !(factor.is_finite() && factor > 0.0) {
            return;
        }
        for corner in &mut self.corners {
            *corner = origin + (*corner - origin) * factor;
        }
        self.center = origin + (self.center - origin) * factor;
        self.invalidate();
    }

    // Configuration

    pub fn set_conversion(&mut self, conversion: f64) -> Result<()> {
        self.conversion = non_negative("conversion", conversion)?;
        self.invalidate();
        Ok(())
    }

    pub fn set_stepsize(&mut self, stepsize: DVec2) -> Result<()> {
        non_negative("horizontal stepsize", stepsize.x)?;
        non_negative("vertical stepsize", stepsize.y)?;
        self.stepsize = stepsize;
        self.invalidate();
        Ok(())
    }

    pub fn set_beamsize(&mut self, beamsize: DVec2) -> Result<()> {
        non_negative("horizontal beamsize", beamsize.x)?;
        non_negative("vertical beamsize", beamsize.y)?;
        self.beamsize = beamsize;
        self.invalidate();
        Ok(())
    }

    /// Out-of-plane tilt in degrees; vertical steps shrink by `cos(pitch)`.
    pub fn set_pitch(&mut self, pitch: f64) -> Result<()> {
        self.pitch = finite("pitch", pitch)?;
        self.pitch_factor = pitch.to_radians().cos();
        self.invalidate();
        Ok(())
    }

    /// Physical position of the pixmap origin, added to every reported position.
    pub fn set_offset(&mut self, offset: DVec2) -> Result<()> {
        finite("horizontal offset", offset.x)?;
        finite("vertical offset", offset.y)?;
        self.offset = Some(offset);
        Ok(())
    }

    pub fn set_pixmap_size(&mut self, size: DVec2) -> Result<()> {
        non_negative("pixmap width", size.x)?;
        non_negative("pixmap height", size.y)?;
        self.pixmap_center = Some(size * 0.5);
        self.invalidate();
        Ok(())
    }

    pub fn set_scan_type(&mut self, scan_type: ScanType) {
        self.scan_type = scan_type;
        self.invalidate();
    }

    pub fn set_scan_type_bits(&mut self, bits: u32) -> Result<()> {
        let scan_type = ScanType::from_bits(bits).ok_or(RasterError::InvalidScanType(bits))?;
        self.set_scan_type(scan_type);
        Ok(())
    }

    // Accessors

    /// Whether the frame has been seeded since construction or the last `clear()`.
    pub fn is_placed(&self) -> bool {
        self.placed
    }

    /// True when any two adjacent corners coincide.
    pub fn is_degenerate(&self) -> bool {
        (0..4).any(|slot| self.corners[slot] == self.corners[(slot + 1) % 4])
    }

    pub fn corner(&self, corner: Corner, unit: Unit) -> DVec2 {
        self.from_pixels(self.corners[corner.index()], unit)
    }

    /// Pixel corners in slot order: top left, top right, bottom right, bottom left.
    pub fn corners(&self) -> [DVec2; 4] {
        self.corners
    }

    pub fn center(&self, unit: Unit) -> DVec2 {
        self.from_pixels(self.center, unit)
    }

    pub fn width(&self, unit: Unit) -> f64 {
        self.length_from_pixels(self.width_px(), unit)
    }

    pub fn height(&self, unit: Unit) -> f64 {
        self.length_from_pixels(self.height_px(), unit)
    }

    /// Angle of the top edge in degrees, always within `(-45, 45]`.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Local horizontal and vertical unit vectors.
    pub fn unit_vectors(&self) -> (DVec2, DVec2) {
        (self.unit_x, self.unit_y)
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn pitch_factor(&self) -> f64 {
        self.pitch_factor
    }

    pub fn stepsize(&self) -> DVec2 {
        self.stepsize
    }

    pub fn beamsize(&self) -> DVec2 {
        self.beamsize
    }

    pub fn conversion(&self) -> f64 {
        self.conversion
    }

    pub fn offset(&self) -> Option<DVec2> {
        self.offset
    }

    pub fn pixmap_center(&self) -> Option<DVec2> {
        self.pixmap_center
    }

    pub fn scan_type(&self) -> ScanType {
        self.scan_type
    }

    // Scan positions

    /// Whether the cached positions reflect the current fields.
    pub fn positions_valid(&self) -> bool {
        self.cache.borrow().valid
    }

    fn grid(&self) -> Ref<'_, ScanGrid> {
        {
            let mut cache = self.cache.borrow_mut();
            if !cache.valid {
                cache.grid = self.build_grid();
                cache.valid = true;
            }
        }
        Ref::map(self.cache.borrow(), |cache| &cache.grid)
    }

    fn build_grid(&self) -> ScanGrid {
        if self.stepsize.x == 0.0 || self.stepsize.y == 0.0 || self.conversion == 0.0 {
            return ScanGrid::default();
        }
        log::trace!("Rebuilding scan positions ({})", self.scan_type);
        positions::generate(&GridLayout {
            origin: self.corners[0],
            unit_x: self.unit_x,
            unit_y: self.unit_y,
            extent: DVec2::new(self.width_px(), self.height_px()),
            beam: self.beam_pixels(),
            steps: self.pixel_steps(),
            triangular_offset: self.conversion * 0.5 * self.stepsize.x,
            scan_type: self.scan_type,
        })
    }

    fn physical_mapping(&self) -> Option<(f64, DVec2)> {
        if self.conversion == 0.0 || self.pixmap_center.is_none() {
            return None;
        }
        Some((self.conversion, self.offset?))
    }

    /// All scan positions in physical units, in visiting order, including the
    /// return path of a bidirectional scan.
    ///
    /// Empty until conversion, pixmap size and offset have been set.
    pub fn scan_positions(&self) -> Vec<DVec2> {
        let Some((conversion, offset)) = self.physical_mapping() else {
            return Vec::new();
        };
        self.grid()
            .positions()
            .iter()
            .map(|position| *position / conversion + offset)
            .collect()
    }

    /// Scan positions in physical units grouped into lines.
    pub fn scan_rows(&self) -> Vec<Vec<DVec2>> {
        let Some((conversion, offset)) = self.physical_mapping() else {
            return Vec::new();
        };
        self.grid()
            .rows()
            .iter()
            .map(|row| row.iter().map(|p| *p / conversion + offset).collect())
            .collect()
    }

    pub fn scan_row(&self, index: usize) -> Option<Vec<DVec2>> {
        let (conversion, offset) = self.physical_mapping()?;
        let grid = self.grid();
        let row = grid.rows().get(index)?;
        Some(row.iter().map(|p| *p / conversion + offset).collect())
    }

    /// Scan positions in pixels, in visiting order.
    pub fn pixel_positions(&self) -> Vec<DVec2> {
        self.grid().positions().to_vec()
    }

    pub fn pixel_rows(&self) -> Vec<Vec<DVec2>> {
        self.grid().rows().to_vec()
    }

    /// Number of points on the inner and outer axis of the base grid.
    pub fn scan_counts(&self) -> (usize, usize) {
        let grid = self.grid();
        (grid.inner_count(), grid.outer_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> RasterFrame {
        let mut frame = RasterFrame::new();
        frame.set_conversion(1.0).unwrap();
        frame.set_stepsize(DVec2::new(10.0, 10.0)).unwrap();
        frame.set_beamsize(DVec2::new(10.0, 10.0)).unwrap();
        frame
    }

    fn assert_close(a: DVec2, b: DVec2) {
        assert!(a.distance(b) < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_new_frame_is_unplaced() {
        let frame = RasterFrame::new();
        assert!(!frame.is_placed());
        assert_eq!(frame.angle(), 0.0);
        assert_eq!(frame.unit_vectors(), (DVec2::X, DVec2::Y));
        assert!(!frame.positions_valid());
        assert_eq!(frame.width(Unit::Physical), 0.0);
    }

    #[test]
    fn test_first_corner_seeds_frame() {
        let mut frame = configured();
        frame.set_bottom_right(DVec2::new(40.0, 30.0), Unit::Pixel);
        assert!(frame.is_placed());
        assert_eq!(frame.corners(), [DVec2::new(40.0, 30.0); 4]);
    }

    #[test]
    fn test_set_corner_snaps_to_grid() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(33.0, 18.0), Unit::Pixel);
        assert_eq!(frame.width(Unit::Pixel), 30.0);
        assert_eq!(frame.height(Unit::Pixel), 20.0);
        assert_close(frame.corner(Corner::TopLeft, Unit::Pixel), DVec2::ZERO);
        assert_close(
            frame.corner(Corner::BottomRight, Unit::Pixel),
            DVec2::new(30.0, 20.0),
        );
        assert_close(frame.center(Unit::Pixel), DVec2::new(15.0, 10.0));
    }

    #[test]
    fn test_set_corner_across_anchor_relabels() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::new(100.0, 100.0), Unit::Pixel);
        frame.set_bottom_right(DVec2::new(130.0, 120.0), Unit::Pixel);

        // Drag the bottom right corner up and left past the top left anchor.
        frame.set_bottom_right(DVec2::new(70.0, 80.0), Unit::Pixel);
        assert_close(
            frame.corner(Corner::BottomRight, Unit::Pixel),
            DVec2::new(100.0, 100.0),
        );
        assert_close(
            frame.corner(Corner::TopLeft, Unit::Pixel),
            DVec2::new(70.0, 80.0),
        );
        assert_close(
            frame.corner(Corner::TopRight, Unit::Pixel),
            DVec2::new(100.0, 80.0),
        );
        assert_close(
            frame.corner(Corner::BottomLeft, Unit::Pixel),
            DVec2::new(70.0, 100.0),
        );
    }

    #[test]
    fn test_zero_drag_collapses_at_anchor() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(30.0, 20.0), Unit::Pixel);
        frame.set_corner(DVec2::ZERO, Corner::TopLeft, Unit::Pixel);
        assert_eq!(frame.corners(), [DVec2::ZERO; 4]);
        assert_eq!(frame.width(Unit::Pixel), 0.0);
    }

    #[test]
    fn test_physical_input_without_conversion_is_ignored() {
        let mut frame = RasterFrame::new();
        frame.set_all_corners(DVec2::new(5.0, 5.0), Unit::Physical);
        assert!(!frame.is_placed());
        frame.move_by(DVec2::new(1.0, 1.0), Unit::Physical, false);
        assert_eq!(frame.center(Unit::Pixel), DVec2::ZERO);
    }

    #[test]
    fn test_expand_right_snaps() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(30.0, 20.0), Unit::Pixel);
        frame.expand_right(Amount::Scalar(7.0), Unit::Pixel);
        assert_eq!(frame.width(Unit::Pixel), 40.0);
        frame.expand_right(Amount::Vector(DVec2::new(-4.0, 50.0)), Unit::Pixel);
        assert_eq!(frame.width(Unit::Pixel), 40.0);
        assert_eq!(frame.height(Unit::Pixel), 20.0);
    }

    #[test]
    fn test_expand_left_with_drag_vector() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(30.0, 20.0), Unit::Pixel);
        frame.expand_left(Amount::Vector(DVec2::new(-19.0, 3.0)), Unit::Pixel);
        assert_eq!(frame.width(Unit::Pixel), 50.0);
        assert_close(
            frame.corner(Corner::TopLeft, Unit::Pixel),
            DVec2::new(-20.0, 0.0),
        );
        assert_close(frame.center(Unit::Pixel), DVec2::new(5.0, 10.0));
    }

    #[test]
    fn test_expand_past_opposite_edge_swaps_labels() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(30.0, 20.0), Unit::Pixel);
        frame.expand_right(Amount::Scalar(-60.0), Unit::Pixel);
        assert_eq!(frame.width(Unit::Pixel), 30.0);
        assert_close(
            frame.corner(Corner::TopLeft, Unit::Pixel),
            DVec2::new(-30.0, 0.0),
        );
        assert_close(frame.corner(Corner::TopRight, Unit::Pixel), DVec2::ZERO);
        assert!(frame.corner(Corner::TopLeft, Unit::Pixel).x < frame.corner(Corner::TopRight, Unit::Pixel).x);

        frame.expand_bottom(Amount::Scalar(-45.0), Unit::Pixel);
        assert_eq!(frame.height(Unit::Pixel), 30.0);
        assert_close(
            frame.corner(Corner::TopLeft, Unit::Pixel),
            DVec2::new(-30.0, -30.0),
        );
        assert_close(frame.corner(Corner::BottomRight, Unit::Pixel), DVec2::ZERO);
    }

    #[test]
    fn test_set_width_keeps_center() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(30.0, 20.0), Unit::Pixel);
        frame.set_width(50.0, Unit::Pixel);
        assert_eq!(frame.width(Unit::Pixel), 50.0);
        assert_close(frame.center(Unit::Pixel), DVec2::new(15.0, 10.0));
        frame.set_height(40.0, Unit::Pixel);
        assert_eq!(frame.height(Unit::Pixel), 40.0);
        assert_close(frame.center(Unit::Pixel), DVec2::new(15.0, 10.0));
    }

    #[test]
    fn test_move_keeping_physical_position() {
        let mut frame = configured();
        frame.set_conversion(2.0).unwrap();
        frame.set_offset(DVec2::new(100.0, 200.0)).unwrap();
        frame.set_pixmap_size(DVec2::new(640.0, 480.0)).unwrap();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(60.0, 40.0), Unit::Pixel);
        let before = frame.scan_positions();
        assert!(!before.is_empty());

        frame.move_by(DVec2::new(8.0, -4.0), Unit::Pixel, true);
        assert_eq!(frame.offset(), Some(DVec2::new(96.0, 202.0)));
        let after = frame.scan_positions();
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(&after) {
            assert_close(*a, *b);
        }

        frame.move_by(DVec2::new(5.0, 0.0), Unit::Physical, false);
        assert_close(after[0] + DVec2::new(5.0, 0.0), frame.scan_positions()[0]);
    }

    #[test]
    fn test_rotate_keeps_angle_in_range() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(30.0, 20.0), Unit::Pixel);
        for delta in [30.0, 20.0, 44.0, -170.0, 721.0, -45.0, 90.0, 0.5] {
            frame.rotate(Rotation::Degrees(delta), None, Unit::Pixel);
            let angle = frame.angle();
            assert!(angle > -45.0 && angle <= 45.0, "angle {angle} out of range");
        }
    }

    #[test]
    fn test_rotate_quarter_turn_relabels() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(30.0, 20.0), Unit::Pixel);
        frame.rotate(Rotation::Degrees(90.0), Some(DVec2::ZERO), Unit::Pixel);

        assert!(frame.angle().abs() < 1e-9);
        assert!((frame.width(Unit::Pixel) - 20.0).abs() < 1e-9);
        assert!((frame.height(Unit::Pixel) - 30.0).abs() < 1e-9);
        assert_close(
            frame.corner(Corner::TopLeft, Unit::Pixel),
            DVec2::new(0.0, -30.0),
        );
        assert_close(
            frame.corner(Corner::BottomRight, Unit::Pixel),
            DVec2::new(20.0, 0.0),
        );
        let (x, y) = frame.unit_vectors();
        assert_close(x, DVec2::X);
        assert_close(y, DVec2::Y);
    }

    #[test]
    fn test_rotate_by_drag() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(30.0, 20.0), Unit::Pixel);
        let anchor = frame.corner(Corner::TopLeft, Unit::Pixel);
        frame.rotate(
            Rotation::Drag {
                from: DVec2::new(10.0, 0.0),
                to: DVec2::new(10.0, -5.0),
            },
            Some(anchor),
            Unit::Pixel,
        );
        assert!((frame.angle() - 0.5f64.atan().to_degrees()).abs() < 1e-9);
        assert_close(frame.corner(Corner::TopLeft, Unit::Pixel), DVec2::ZERO);
    }

    #[test]
    fn test_set_angle_is_absolute() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(30.0, 20.0), Unit::Pixel);
        frame.set_angle(20.0);
        frame.set_angle(-30.0);
        assert!((frame.angle() + 30.0).abs() < 1e-9);
        assert_close(frame.center(Unit::Pixel), DVec2::new(15.0, 10.0));
    }

    #[test]
    fn test_scale_around_pixmap_center() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(30.0, 20.0), Unit::Pixel);
        frame.scale(2.0);
        assert_eq!(frame.width(Unit::Pixel), 30.0);

        frame.set_pixmap_size(DVec2::new(20.0, 20.0)).unwrap();
        frame.scale(2.0);
        assert_eq!(frame.width(Unit::Pixel), 60.0);
        assert_close(
            frame.corner(Corner::TopLeft, Unit::Pixel),
            DVec2::new(-10.0, -10.0),
        );
    }

    #[test]
    fn test_setters_reject_invalid_values() {
        let mut frame = configured();
        assert_eq!(
            frame.set_conversion(-1.0),
            Err(RasterError::Negative {
                field: "conversion",
                value: -1.0
            })
        );
        assert_eq!(frame.conversion(), 1.0);
        assert!(frame.set_stepsize(DVec2::new(f64::NAN, 1.0)).is_err());
        assert_eq!(frame.stepsize(), DVec2::new(10.0, 10.0));
        assert!(frame.set_pitch(f64::INFINITY).is_err());
        assert_eq!(
            frame.set_scan_type_bits(64),
            Err(RasterError::InvalidScanType(64))
        );
        assert_eq!(frame.scan_type(), ScanType::empty());
    }

    #[test]
    fn test_clear_keeps_configuration() {
        let mut frame = configured();
        frame.set_all_corners(DVec2::ZERO, Unit::Pixel);
        frame.set_bottom_right(DVec2::new(30.0, 20.0), Unit::Pixel);
        frame.set_angle(10.0);
        frame.clear();
        assert!(!frame.is_placed());
        assert_eq!(frame.angle(), 0.0);
        assert_eq!(frame.corners(), [DVec2::ZERO; 4]);
        assert_eq!(frame.stepsize(), DVec2::new(10.0, 10.0));
    }
}
