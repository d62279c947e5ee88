//! Line segments and junction angles.

use nalgebra::Vector2;

use crate::point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered pair of points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
}

impl Segment {
    /// Creates a new segment.
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Segment length [mm].
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Unit direction vector, or `None` for a degenerate segment.
    pub fn direction(&self) -> Option<Vector2<f64>> {
        let v = Vector2::new(self.end.x - self.start.x, self.end.y - self.start.y);
        let norm = v.norm();
        if norm < 1e-12 {
            None
        } else {
            Some(v / norm)
        }
    }
}

/// Interior junction angle between an incoming and an outgoing segment
/// sharing an endpoint, in degrees.
///
/// 180° means the outgoing segment continues straight through, 0° means
/// it goes back along the incoming one. Degenerate segments yield the
/// conservative 90°.
pub fn junction_angle_deg(incoming: &Segment, outgoing: &Segment) -> f64 {
    match (incoming.direction(), outgoing.direction()) {
        (Some(d1), Some(d2)) => 180.0 - d1.angle(&d2).to_degrees(),
        _ => 90.0,
    }
}

/// Interior junction angles at the internal endpoints of a path,
/// in traversal order. A path of `n` segments has `n - 1` junctions.
pub fn path_junction_angles_deg(segments: &[Segment]) -> Vec<f64> {
    segments
        .windows(2)
        .map(|pair| junction_angle_deg(&pair[0], &pair[1]))
        .collect()
}
