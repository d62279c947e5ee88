//! Toolpath extraction.
//!
//! Turns a drawing into toolpath statistics and per-contour motion
//! inputs:
//!
//! 1. **Tessellation**: every primitive flattens to a polyline at the
//!    chord tolerance
//! 2. **Stitching**: polylines chain into contours wherever endpoints
//!    coincide within 0.1 mm
//! 3. **Classification**: the outer contour is picked by bounding-box
//!    containment; closed contours inside it are holes
//! 4. **Statistics**: cut length, pierces, short-segment ratio,
//!    occupied and net area, entity histogram

use std::collections::BTreeMap;

use nestcost_core::{Error, Result, Warning};
use nestcost_geometry::{
    clamp_chord_tolerance, stitch_paths, Contour, Segment, DEFAULT_CHORD_TOLERANCE_MM,
    STITCH_TOLERANCE_MM,
};

use crate::drawing::Drawing;
use crate::stats::{ContourMotion, MotionInputs, ToolpathStats, SHORT_SEGMENT_THRESHOLD_MM};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Extraction parameters.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtractorConfig {
    /// Chord tolerance for arc/spline flattening [mm], clamped to
    /// 0.05–0.2.
    pub chord_tolerance_mm: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            chord_tolerance_mm: DEFAULT_CHORD_TOLERANCE_MM,
        }
    }
}

impl ExtractorConfig {
    /// Creates a config with the default chord tolerance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chord tolerance [mm].
    pub fn with_chord_tolerance(mut self, tolerance_mm: f64) -> Self {
        self.chord_tolerance_mm = tolerance_mm;
        self
    }

    /// The effective, clamped tolerance [mm].
    pub fn effective_tolerance(&self) -> f64 {
        clamp_chord_tolerance(self.chord_tolerance_mm)
    }
}

/// Result of extracting a drawing.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Derived statistics.
    pub stats: ToolpathStats,
    /// Per-contour motion data for the lookahead planner.
    pub motion: MotionInputs,
    /// Non-fatal conditions encountered.
    pub warnings: Vec<Warning>,
}

/// Extracts contours from a drawing without deriving statistics.
///
/// Exposed separately because content hashing operates on the same
/// canonical contour set.
pub fn extract_contours(drawing: &Drawing, config: &ExtractorConfig) -> Vec<Contour> {
    let tolerance = config.effective_tolerance();
    let paths: Vec<_> = drawing
        .primitives
        .iter()
        .map(|primitive| primitive.flatten(tolerance))
        .filter(|path| path.len() >= 2)
        .collect();

    stitch_paths(paths, STITCH_TOLERANCE_MM)
}

/// Extracts toolpath statistics and motion inputs from a drawing.
///
/// Fails with [`Error::DegenerateGeometry`] when the drawing has no
/// cuttable length. Contours that do not close produce an
/// [`Warning::OpenContour`]; their length is still counted.
pub fn extract(drawing: &Drawing, config: &ExtractorConfig) -> Result<Extraction> {
    let contours = extract_contours(drawing, config);
    extract_from_contours(drawing, &contours)
}

/// Derives statistics from already-extracted contours.
pub fn extract_from_contours(drawing: &Drawing, contours: &[Contour]) -> Result<Extraction> {
    let mut entity_counts: BTreeMap<String, usize> = BTreeMap::new();
    for primitive in &drawing.primitives {
        *entity_counts
            .entry(primitive.kind().as_str().to_string())
            .or_insert(0) += 1;
    }

    let mut warnings = Vec::new();

    let mut cut_length = 0.0;
    let mut short_length = 0.0;
    let mut closed_count = 0;
    let mut open_count = 0;
    let mut motion_contours = Vec::with_capacity(contours.len());

    for contour in contours {
        let segments = contour.segments();
        let lengths: Vec<f64> = segments.iter().map(Segment::length).collect();

        cut_length += lengths.iter().sum::<f64>();
        short_length += lengths
            .iter()
            .filter(|&&l| l < SHORT_SEGMENT_THRESHOLD_MM)
            .sum::<f64>();

        if contour.is_closed() {
            closed_count += 1;
        } else {
            open_count += 1;
        }

        motion_contours.push(ContourMotion {
            junction_angles_deg: contour.junction_angles_deg(),
            lengths_mm: lengths,
        });
    }

    if cut_length <= 0.0 {
        return Err(Error::DegenerateGeometry(format!(
            "drawing '{}' has zero cut length",
            drawing.id
        )));
    }

    if open_count > 0 {
        tracing::debug!(
            drawing_id = %drawing.id,
            open_count,
            "drawing contains contours that do not close"
        );
        warnings.push(Warning::OpenContour {
            drawing_id: drawing.id.clone(),
        });
    }

    let (occupied_area, net_area) = occupied_and_net_area(contours);

    let stats = ToolpathStats {
        cut_length_mm: cut_length,
        pierce_count: closed_count,
        contour_count: closed_count,
        open_contour_count: open_count,
        short_segment_ratio: if cut_length > 0.0 {
            short_length / cut_length
        } else {
            0.0
        },
        occupied_area_mm2: occupied_area,
        net_area_mm2: net_area,
        entity_counts,
    };

    Ok(Extraction {
        stats,
        motion: MotionInputs {
            contours: motion_contours,
        },
        warnings,
    })
}

/// Occupied area (outer contour, holes not subtracted) and net area
/// (holes subtracted).
///
/// The outer contour is the closed contour whose bounding box contains
/// every other contour's box; when no single contour contains the rest,
/// the largest closed contour stands in. With no closed contour at all,
/// the drawing's overall bounding box is used.
fn occupied_and_net_area(contours: &[Contour]) -> (f64, f64) {
    let boxes: Vec<_> = contours.iter().map(Contour::bounding_box).collect();

    let closed_indices: Vec<usize> = contours
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_closed())
        .map(|(i, _)| i)
        .collect();

    if closed_indices.is_empty() {
        // Open geometry only: fall back to the drawing's bounding box
        let area = overall_bbox_area(&boxes);
        return (area, area);
    }

    let outer_idx = closed_indices
        .iter()
        .copied()
        .find(|&i| {
            let Some(outer_box) = &boxes[i] else {
                return false;
            };
            boxes
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .all(|(_, b)| b.as_ref().map_or(true, |b| outer_box.contains(b)))
        })
        .unwrap_or_else(|| {
            closed_indices
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    contours[a]
                        .area()
                        .partial_cmp(&contours[b].area())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap()
        });

    let occupied = contours[outer_idx].area();

    let holes_area: f64 = closed_indices
        .iter()
        .copied()
        .filter(|&i| i != outer_idx && contours[outer_idx].contains(&contours[i]))
        .map(|i| contours[i].area())
        .sum();

    (occupied, (occupied - holes_area).max(0.0))
}

fn overall_bbox_area(boxes: &[Option<nestcost_geometry::BoundingBox>]) -> f64 {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for b in boxes.iter().flatten() {
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    if min_x.is_finite() && max_x > min_x && max_y > min_y {
        (max_x - min_x) * (max_y - min_y)
    } else {
        0.0
    }
}
