//! Enumeration of scan positions inside a raster frame.

use glam::DVec2;

use crate::ScanType;

/// Upper bound on the number of base grid points a single frame may enumerate.
/// Larger grids come from pathological step sizes and resolve to an empty scan.
pub const MAX_SCAN_POINTS: usize = 1_000_000;

/// Scan positions of a frame in pixels, in visiting order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanGrid {
    positions: Vec<DVec2>,
    rows: Vec<Vec<DVec2>>,
    inner_count: usize,
    outer_count: usize,
}

impl ScanGrid {
    /// Every position in visiting order, including a bidirectional return path.
    pub fn positions(&self) -> &[DVec2] {
        &self.positions
    }

    /// Positions grouped by scan line, one line per outer step. The return
    /// path of a bidirectional scan only appears in [`ScanGrid::positions`].
    pub fn rows(&self) -> &[Vec<DVec2>] {
        &self.rows
    }

    /// Points per line of the base grid.
    pub fn inner_count(&self) -> usize {
        self.inner_count
    }

    /// Number of lines of the base grid.
    pub fn outer_count(&self) -> usize {
        self.outer_count
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Pixel-space description of the area to scan.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GridLayout {
    pub origin: DVec2,
    pub unit_x: DVec2,
    pub unit_y: DVec2,
    /// Width and height along the unit vectors.
    pub extent: DVec2,
    pub beam: DVec2,
    pub steps: DVec2,
    /// Shift of the staggered lines of a triangular scan along the inner axis.
    pub triangular_offset: f64,
    pub scan_type: ScanType,
}

fn axis_count(extent: f64, beam: f64, step: f64) -> usize {
    let extent = if extent.is_finite() { extent } else { 0.0 };
    let count = ((extent - beam) / step).round() + 1.0;
    if count >= 1.0 { count as usize } else { 0 }
}

fn offsets(axis: DVec2, count: usize, step: f64, start: f64) -> Vec<DVec2> {
    (0..count)
        .map(|i| axis * (i as f64 * step + start))
        .collect()
}

pub(crate) fn generate(layout: &GridLayout) -> ScanGrid {
    let steps = layout.steps;
    if !(steps.is_finite() && steps.x > 0.0 && steps.y > 0.0) {
        return ScanGrid::default();
    }

    let columns = axis_count(layout.extent.x, layout.beam.x, steps.x);
    let lines = axis_count(layout.extent.y, layout.beam.y, steps.y);
    if columns == 0 || lines == 0 {
        return ScanGrid::default();
    }
    if columns.saturating_mul(lines) > MAX_SCAN_POINTS {
        log::warn!(
            "Refusing to enumerate a {columns}x{lines} scan grid (limit is {MAX_SCAN_POINTS} points)"
        );
        return ScanGrid::default();
    }

    let scan_type = layout.scan_type;
    let vertical_scan = scan_type.contains(ScanType::VERTICAL);
    let triangular = scan_type.contains(ScanType::TRIANGULAR);
    let snake = scan_type.contains(ScanType::SNAKE);
    let margin = layout.beam * 0.5;

    let mut horizontal = offsets(layout.unit_x, columns, steps.x, margin.x);
    let mut vertical = offsets(layout.unit_y, lines, steps.y, margin.y);

    // Staggered lines have one point less and run along the inner axis.
    let mut staggered = if !triangular {
        Vec::new()
    } else if vertical_scan {
        offsets(
            layout.unit_y,
            lines.saturating_sub(1),
            steps.y,
            margin.y + layout.triangular_offset,
        )
    } else {
        offsets(
            layout.unit_x,
            columns.saturating_sub(1),
            steps.x,
            margin.x + layout.triangular_offset,
        )
    };

    if scan_type.contains(ScanType::FLIP_HORIZONTAL) {
        horizontal.reverse();
        if !vertical_scan {
            staggered.reverse();
        }
    }
    if scan_type.contains(ScanType::FLIP_VERTICAL) {
        vertical.reverse();
        if vertical_scan {
            staggered.reverse();
        }
    }

    let (outer, mut inner) = if vertical_scan {
        (horizontal, vertical)
    } else {
        (vertical, horizontal)
    };
    let inner_count = inner.len();
    let outer_count = outer.len();

    let mut rows = Vec::with_capacity(outer.len());
    for outer_offset in &outer {
        rows.push(
            inner
                .iter()
                .map(|inner_offset| layout.origin + *outer_offset + *inner_offset)
                .collect::<Vec<_>>(),
        );
        if snake {
            inner.reverse();
            staggered.reverse();
        }
        if triangular {
            std::mem::swap(&mut inner, &mut staggered);
        }
    }

    let mut positions: Vec<DVec2> = rows.iter().flatten().copied().collect();
    if scan_type.contains(ScanType::BIDIRECTIONAL) {
        let returning: Vec<DVec2> = positions.iter().rev().skip(1).copied().collect();
        positions.extend(returning);
    }

    ScanGrid {
        positions,
        rows,
        inner_count,
        outer_count,
    }
}
