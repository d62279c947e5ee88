//! Error and warning types for the costing engine.

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result type alias for costing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a costing run.
///
/// A run has no partial output: the first fatal error surfaces here,
/// tagged with the responsible sheet, part instance, or drawing.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed nesting result (missing required fields, negative areas).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No applicable rate for a material/thickness pair.
    #[error("No rate for material '{material_id}' at {thickness_mm} mm")]
    RateMissing {
        /// Material that was looked up.
        material_id: String,
        /// Requested thickness in millimetres.
        thickness_mm: f64,
    },

    /// Toolpath stats absent from the cache and no drawing available.
    #[error("Toolpath stats missing for drawing '{drawing_id}'")]
    StatsMissing {
        /// Drawing whose stats could not be resolved.
        drawing_id: String,
    },

    /// Zero-length toolpath or unusable outer contour.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Per-sheet sums disagree beyond tolerance, or a negative result.
    #[error("Invariant violation on sheet '{sheet_id}': {detail}")]
    InvariantViolation {
        /// Sheet on which the violation was detected.
        sheet_id: String,
        /// Human-readable description of the violated invariant.
        detail: String,
    },

    /// Computation cancelled between sheets.
    #[error("Computation cancelled")]
    Cancelled,
}

/// Non-fatal conditions collected alongside a cost summary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Warning {
    /// A contour did not close within tolerance; stats were still emitted
    /// using the open path.
    OpenContour {
        /// Drawing containing the open contour.
        drawing_id: String,
    },

    /// No exact rate for the requested thickness; a nearby one was used.
    RateSubstituted {
        /// Material that was looked up.
        material_id: String,
        /// Thickness that was requested [mm].
        requested_mm: f64,
        /// Thickness of the rate that was substituted [mm].
        matched_mm: f64,
    },

    /// A buffer factor below 1.0 was supplied; permitted but flagged.
    BufferBelowOne {
        /// The offending factor.
        buffer_factor: f64,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenContour { drawing_id } => {
                write!(f, "open contour in drawing '{}'", drawing_id)
            }
            Self::RateSubstituted {
                material_id,
                requested_mm,
                matched_mm,
            } => write!(
                f,
                "rate for '{}' {} mm substituted with {} mm",
                material_id, requested_mm, matched_mm
            ),
            Self::BufferBelowOne { buffer_factor } => {
                write!(f, "buffer factor {} is below 1.0", buffer_factor)
            }
        }
    }
}
