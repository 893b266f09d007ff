//! Geometric primitives shared by the raster frame and the position generator.
//!
//! Pixel space is y-down, matching the camera image the raster is drawn on.
//! Angles are in degrees and positive counter-clockwise as seen on screen.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Unit of a length or point handed to (or read from) a [`crate::RasterFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Image pixels.
    Pixel,
    /// Physical units (usually µm), converted through the frame's conversion factor.
    #[default]
    Physical,
}

/// One of the four corner slots of the raster rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// All corners in slot order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Slot index, clockwise starting at the top left corner.
    pub fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }

    /// The diagonally opposite corner.
    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomRight => Corner::TopLeft,
            Corner::BottomLeft => Corner::TopRight,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomRight => "bottom-right",
            Corner::BottomLeft => "bottom-left",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the four edges of the raster rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];

    /// The two corners bounding this edge, in clockwise order.
    pub fn corners(self) -> (Corner, Corner) {
        match self {
            Edge::Top => (Corner::TopLeft, Corner::TopRight),
            Edge::Right => (Corner::TopRight, Corner::BottomRight),
            Edge::Bottom => (Corner::BottomRight, Corner::BottomLeft),
            Edge::Left => (Corner::BottomLeft, Corner::TopLeft),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Edge::Top => "top",
            Edge::Right => "right",
            Edge::Bottom => "bottom",
            Edge::Left => "left",
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amount an edge is expanded by.
///
/// A vector is a pointer drag; only its component along the edge's outward
/// normal is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Scalar(f64),
    Vector(DVec2),
}

impl Amount {
    pub(crate) fn scaled(self, factor: f64) -> Amount {
        match self {
            Amount::Scalar(value) => Amount::Scalar(value * factor),
            Amount::Vector(vector) => Amount::Vector(vector * factor),
        }
    }

    /// Signed length of this amount along `direction` (a unit vector).
    pub(crate) fn along(self, direction: DVec2) -> f64 {
        match self {
            Amount::Scalar(value) => value,
            Amount::Vector(vector) => vector.dot(direction),
        }
    }
}

/// How far to rotate a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rotation {
    /// A literal angle in degrees, counter-clockwise on screen.
    Degrees(f64),
    /// The signed angle between `anchor → from` and `anchor → to`.
    Drag { from: DVec2, to: DVec2 },
}

/// Classification of a point against the raster, used for hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "which", rename_all = "lowercase")]
pub enum PointRelation {
    Outside,
    Inside,
    Edge(Edge),
    Corner(Corner),
}

impl fmt::Display for PointRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointRelation::Outside => f.write_str("outside"),
            PointRelation::Inside => f.write_str("inside"),
            PointRelation::Edge(edge) => write!(f, "{edge} edge"),
            PointRelation::Corner(corner) => write!(f, "{corner} corner"),
        }
    }
}

/// Horizontal unit vector of a rectangle rotated by `angle_deg`.
pub(crate) fn unit_x_for_angle(angle_deg: f64) -> DVec2 {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    DVec2::new(cos, -sin)
}

/// `unit_x` rotated by +90° on screen.
pub(crate) fn perpendicular(unit_x: DVec2) -> DVec2 {
    DVec2::new(-unit_x.y, unit_x.x)
}

/// Round `extent` to the nearest `beam + k * step` with `k >= 0`.
///
/// A step that is zero, negative or not finite disables snapping; the extent
/// is then only clamped to be non-negative.
pub fn snap_extent(extent: f64, beam: f64, step: f64) -> f64 {
    if !extent.is_finite() {
        return 0.0;
    }
    if !(step.is_finite() && step > 0.0) || !beam.is_finite() {
        return extent.max(0.0);
    }
    let k = ((extent - beam) / step).round().max(0.0);
    beam + k * step
}

/// Perpendicular distance from `point` to the segment `a → b`, or `None` when
/// the projection of `point` falls outside the segment.
pub(crate) fn segment_distance(point: DVec2, a: DVec2, b: DVec2) -> Option<f64> {
    let line = b - a;
    let len_sq = line.length_squared();
    if len_sq <= f64::EPSILON {
        return None;
    }
    let t = (point - a).dot(line) / len_sq;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    Some(line.perp_dot(point - a).abs() / len_sq.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_extent_rounds_to_grid() {
        assert_eq!(snap_extent(36.0, 10.0, 13.0), 36.0);
        assert_eq!(snap_extent(40.0, 10.0, 13.0), 36.0);
        assert_eq!(snap_extent(44.0, 10.0, 13.0), 49.0);
    }

    #[test]
    fn test_snap_extent_never_below_beam() {
        assert_eq!(snap_extent(0.0, 10.0, 13.0), 10.0);
        assert_eq!(snap_extent(2.0, 10.0, 13.0), 10.0);
    }

    #[test]
    fn test_snap_extent_without_step() {
        assert_eq!(snap_extent(12.5, 10.0, 0.0), 12.5);
        assert_eq!(snap_extent(-3.0, 10.0, 0.0), 0.0);
        assert_eq!(snap_extent(f64::NAN, 10.0, 13.0), 0.0);
    }

    #[test]
    fn test_segment_distance() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(10.0, 0.0);
        assert_eq!(segment_distance(DVec2::new(5.0, 3.0), a, b), Some(3.0));
        assert_eq!(segment_distance(DVec2::new(5.0, -2.0), a, b), Some(2.0));
        assert_eq!(segment_distance(DVec2::new(12.0, 1.0), a, b), None);
        assert_eq!(segment_distance(DVec2::new(1.0, 1.0), a, a), None);
    }

    #[test]
    fn test_unit_vectors_are_orthonormal() {
        for angle in [-44.9, -10.0, 0.0, 30.0, 45.0] {
            let x = unit_x_for_angle(angle);
            let y = perpendicular(x);
            assert!((x.length() - 1.0).abs() < 1e-12);
            assert!(x.dot(y).abs() < 1e-12);
        }
        assert_eq!(perpendicular(unit_x_for_angle(0.0)), DVec2::new(0.0, 1.0));
    }

    #[test]
    fn test_relation_display() {
        assert_eq!(PointRelation::Inside.to_string(), "inside");
        assert_eq!(PointRelation::Edge(Edge::Left).to_string(), "left edge");
        assert_eq!(
            PointRelation::Corner(Corner::BottomRight).to_string(),
            "bottom-right corner"
        );
    }

    #[test]
    fn test_opposite_corners() {
        for corner in Corner::ALL {
            assert_eq!(corner.opposite().opposite(), corner);
            assert_eq!((corner.index() + 2) % 4, corner.opposite().index());
        }
    }
}
