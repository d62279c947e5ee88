//! # Nestcost Motion
//!
//! Cut-time estimation from segment lengths and junction angles:
//! corner speed limits, forward/backward lookahead, trapezoidal
//! profiles, and the effective-feedrate reduction for dense small
//! segments.
//!
//! Pierce and foil times are added by the cost engine, not here.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod planner;

// Re-exports
pub use planner::{
    contour_time, effective_vmax, estimate_time_heuristic, junction_speed_limit, part_cut_time,
    plan_junction_speeds, trapezoid_time, CORNER_SCALE_FLOOR, MIN_EFFECTIVE_VMAX_FRACTION,
    SHORT_SEGMENT_PENALTY, STRAIGHT_WINDOW_DEG,
};
