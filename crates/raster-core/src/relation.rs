use glam::DVec2;

use crate::geometry::segment_distance;
use crate::{Corner, Edge, PointRelation, RasterFrame};

fn projection(point: DVec2, from: DVec2, to: DVec2) -> f64 {
    let line = to - from;
    (point - from).dot(line) / line.length_squared()
}

impl RasterFrame {
    /// Classify a pixel position against the frame for hit-testing.
    ///
    /// Corners win over edges, edges over the interior. `tolerance` is in
    /// pixels. An unplaced or degenerate frame has no inside.
    pub fn point_relation(&self, point: DVec2, tolerance: f64) -> PointRelation {
        if !self.placed || !point.is_finite() {
            return PointRelation::Outside;
        }

        if let Some(corner) = Corner::ALL
            .into_iter()
            .find(|corner| self.corners[corner.index()].distance(point) <= tolerance)
        {
            return PointRelation::Corner(corner);
        }

        if self.is_degenerate() {
            return PointRelation::Outside;
        }

        for edge in Edge::ALL {
            let (from, to) = edge.corners();
            let distance = segment_distance(
                point,
                self.corners[from.index()],
                self.corners[to.index()],
            );
            if distance.is_some_and(|distance| distance <= tolerance) {
                return PointRelation::Edge(edge);
            }
        }

        let top_left = self.corners[Corner::TopLeft.index()];
        let along_top = projection(point, top_left, self.corners[Corner::TopRight.index()]);
        let along_left = projection(point, top_left, self.corners[Corner::BottomLeft.index()]);
        if (0.0..=1.0).contains(&along_top) && (0.0..=1.0).contains(&along_left) {
            PointRelation::Inside
        } else {
            PointRelation::Outside
        }
    }
}
