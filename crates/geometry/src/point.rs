//! 2D point in millimetres.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D coordinate in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// X coordinate [mm].
    pub x: f64,
    /// Y coordinate [mm].
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Squared Euclidean distance. Use this when comparing distances
    /// (avoids sqrt).
    #[inline]
    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Returns true if the two points are within `tolerance` of each
    /// other.
    pub fn coincides(&self, other: &Point, tolerance: f64) -> bool {
        self.distance_sq(other) <= tolerance * tolerance
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        geo::Coord { x: p.x, y: p.y }
    }
}
