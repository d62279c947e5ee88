//! Placement transforms.
//!
//! The nesting contract places parts with a translation and one of the
//! four quarter-turn rotations.

use nalgebra::{Isometry2, Point2, Vector2};

use crate::point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Quarter-turn rotation of a placed part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QuarterRotation {
    /// No rotation.
    #[default]
    R0,
    /// 90° counter-clockwise.
    R90,
    /// 180°.
    R180,
    /// 270° counter-clockwise.
    R270,
}

impl QuarterRotation {
    /// Rotation in degrees.
    pub fn degrees(&self) -> f64 {
        match self {
            Self::R0 => 0.0,
            Self::R90 => 90.0,
            Self::R180 => 180.0,
            Self::R270 => 270.0,
        }
    }

    /// Parses a rotation from degrees; only the four quarter turns are
    /// valid.
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        let normalized = degrees.rem_euclid(360.0);
        if (normalized - 0.0).abs() < 1e-9 {
            Some(Self::R0)
        } else if (normalized - 90.0).abs() < 1e-9 {
            Some(Self::R90)
        } else if (normalized - 180.0).abs() < 1e-9 {
            Some(Self::R180)
        } else if (normalized - 270.0).abs() < 1e-9 {
            Some(Self::R270)
        } else {
            None
        }
    }
}

/// A part placement: translation plus quarter-turn rotation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    /// Translation in x [mm].
    pub x_mm: f64,
    /// Translation in y [mm].
    pub y_mm: f64,
    /// Quarter-turn rotation.
    pub rotation: QuarterRotation,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Translation-only transform.
    pub fn translation(x_mm: f64, y_mm: f64) -> Self {
        Self {
            x_mm,
            y_mm,
            rotation: QuarterRotation::R0,
        }
    }

    /// Creates a transform with translation and rotation.
    pub fn new(x_mm: f64, y_mm: f64, rotation: QuarterRotation) -> Self {
        Self {
            x_mm,
            y_mm,
            rotation,
        }
    }

    /// Converts to a nalgebra isometry.
    pub fn to_isometry(&self) -> Isometry2<f64> {
        Isometry2::new(
            Vector2::new(self.x_mm, self.y_mm),
            self.rotation.degrees().to_radians(),
        )
    }

    /// Applies the transform (rotation first, then translation) to a
    /// point.
    pub fn apply(&self, point: &Point) -> Point {
        let p = self.to_isometry().transform_point(&Point2::new(point.x, point.y));
        Point::new(p.x, p.y)
    }

    /// Applies the transform to a sequence of points.
    pub fn apply_all(&self, points: &[Point]) -> Vec<Point> {
        let iso = self.to_isometry();
        points
            .iter()
            .map(|point| {
                let p = iso.transform_point(&Point2::new(point.x, point.y));
                Point::new(p.x, p.y)
            })
            .collect()
    }
}
