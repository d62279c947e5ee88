//! Toolpath statistics and motion inputs.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Segments shorter than this count towards the short-segment ratio [mm].
pub const SHORT_SEGMENT_THRESHOLD_MM: f64 = 5.0;

/// Statistics derived once per drawing and memoised by content hash.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ToolpathStats {
    /// Sum of segment lengths across all contours [mm].
    pub cut_length_mm: f64,

    /// Number of closed contours; one pierce per contour start.
    pub pierce_count: usize,

    /// Number of closed contours.
    pub contour_count: usize,

    /// Open chains that did not close within tolerance. They contribute
    /// cut length but no pierces.
    pub open_contour_count: usize,

    /// Share of cut length in segments shorter than
    /// [`SHORT_SEGMENT_THRESHOLD_MM`], in [0, 1].
    pub short_segment_ratio: f64,

    /// Area of the outer contour, holes not subtracted [mm²].
    pub occupied_area_mm2: f64,

    /// Outer area minus holes [mm²].
    pub net_area_mm2: f64,

    /// Histogram of primitive kinds (diagnostic only).
    pub entity_counts: BTreeMap<String, usize>,
}

impl ToolpathStats {
    /// Cut length in metres.
    pub fn cut_length_m(&self) -> f64 {
        nestcost_core::units::mm_to_m(self.cut_length_mm)
    }
}

/// Motion profile of a single contour: `n` segment lengths and the
/// `n − 1` interior junction angles between them. Every contour is cut
/// from rest to rest.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContourMotion {
    /// Segment lengths in cut order [mm].
    pub lengths_mm: Vec<f64>,
    /// Interior junction angles at internal endpoints [deg].
    pub junction_angles_deg: Vec<f64>,
}

impl ContourMotion {
    /// Total contour length [mm].
    pub fn total_length_mm(&self) -> f64 {
        self.lengths_mm.iter().sum()
    }
}

/// Per-contour motion data for the lookahead planner (Tier-2 cache
/// payload).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionInputs {
    /// One entry per contour, in extraction order.
    pub contours: Vec<ContourMotion>,
}

impl MotionInputs {
    /// Total length across all contours [mm].
    pub fn total_length_mm(&self) -> f64 {
        self.contours.iter().map(ContourMotion::total_length_mm).sum()
    }
}
