//! # Nestcost Geometry
//!
//! 2D geometry for toolpath extraction: points and segments in
//! millimetres, drawing primitives with chord-tolerance tessellation,
//! contour stitching with closure detection, and the quarter-turn
//! placement transform used by the nesting contract.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod contour;
pub mod point;
pub mod primitive;
pub mod segment;
pub mod transform;

// Re-exports
pub use contour::{stitch_paths, BoundingBox, Contour, MERGE_TOLERANCE_MM, STITCH_TOLERANCE_MM};
pub use point::Point;
pub use primitive::{
    clamp_chord_tolerance, PolyVertex, Primitive, PrimitiveKind, DEFAULT_CHORD_TOLERANCE_MM,
};
pub use segment::{junction_angle_deg, path_junction_angles_deg, Segment};
pub use transform::{QuarterRotation, Transform};
