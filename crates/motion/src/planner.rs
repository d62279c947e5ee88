//! Lookahead velocity planning and trapezoidal segment timing.
//!
//! The planner mirrors the forward/backward pass used by CNC motion
//! controllers: junction angles cap the speed at each internal
//! endpoint, the forward pass limits what acceleration can reach, the
//! backward pass limits what deceleration can shed, and each segment is
//! then timed with a trapezoidal (or triangular) profile. Every contour
//! is planned from rest to rest: the head stops to pierce before each
//! contour and stops again at its end.

use nestcost_core::{CornerModel, MachineProfile};
use nestcost_toolpath::{ContourMotion, MotionInputs};

/// Junction angles within this many degrees of 180° are treated as
/// straight through.
pub const STRAIGHT_WINDOW_DEG: f64 = 1.0;

/// Floor on the square-corner scale factor for very sharp angles.
pub const CORNER_SCALE_FLOOR: f64 = 0.2;

/// Penalty factor applied to the short-segment ratio when reducing the
/// effective feedrate.
pub const SHORT_SEGMENT_PENALTY: f64 = 0.7;

/// The effective feedrate never drops below this fraction of nominal.
pub const MIN_EFFECTIVE_VMAX_FRACTION: f64 = 0.3;

/// Speed cap at a junction with the given interior angle.
///
/// `angle_deg` follows the junction convention: 0° is a full reversal,
/// 90° a square corner, 180° straight through.
pub fn junction_speed_limit(
    angle_deg: f64,
    v_max: f64,
    a_max: f64,
    model: &CornerModel,
) -> f64 {
    let angle = angle_deg.clamp(0.0, 180.0);

    if angle >= 180.0 - STRAIGHT_WINDOW_DEG {
        return v_max;
    }

    match *model {
        CornerModel::SquareCorner { v_corner_90_mm_s } => {
            // 90° -> v_corner_90, 180° -> 2x, floored for sharp angles
            let scale = 1.0 + (angle - 90.0) / 90.0;
            v_max.min(v_corner_90_mm_s * scale.max(CORNER_SCALE_FLOOR))
        }
        CornerModel::JunctionDeviation { deviation_mm } => {
            // Direction change at the junction is the supplement of the
            // interior angle; the permitted deviation bounds the virtual
            // corner radius: R = delta * sin(theta/2) / (1 - cos(theta/2))
            let half_theta = (180.0 - angle).to_radians() / 2.0;
            let sin_half = half_theta.sin();
            let cos_half = half_theta.cos();
            if sin_half < 1e-3 || 1.0 - cos_half < 1e-9 {
                return v_max;
            }
            let radius = deviation_mm * sin_half / (1.0 - cos_half);
            v_max.min((a_max * radius).sqrt())
        }
    }
}

/// Forward/backward lookahead over one rest-to-rest path.
///
/// `lengths` holds the `n` segment lengths; `junction_limits` the
/// `n + 1` speed caps at the junctions, where the first and last entry
/// are forced to zero. Returns the planned speed at every junction.
pub fn plan_junction_speeds(
    lengths: &[f64],
    junction_limits: &[f64],
    v_max: f64,
    a_max: f64,
) -> Vec<f64> {
    let n = lengths.len();
    if n == 0 {
        return vec![0.0];
    }
    debug_assert_eq!(junction_limits.len(), n + 1);

    let mut v = vec![0.0; n + 1];

    // Forward pass: what acceleration from the previous junction allows
    for k in 1..n {
        let reachable = (v[k - 1] * v[k - 1] + 2.0 * a_max * lengths[k - 1]).sqrt();
        v[k] = junction_limits[k].min(v_max).min(reachable);
    }
    v[n] = 0.0;

    // Backward pass: what deceleration into the next junction allows
    for k in (0..n).rev() {
        let reachable = (v[k + 1] * v[k + 1] + 2.0 * a_max * lengths[k]).sqrt();
        v[k] = v[k].min(reachable);
    }

    v
}

/// Time to traverse one segment with a trapezoidal profile.
///
/// The profile accelerates from `v_entry`, cruises at the peak if the
/// segment is long enough, and decelerates to `v_exit`. Segments too
/// short to reach `v_max` collapse to a triangular profile because the
/// cruise distance clamps to zero.
pub fn trapezoid_time(length: f64, v_entry: f64, v_exit: f64, v_max: f64, a_max: f64) -> f64 {
    if length <= 0.0 {
        return 0.0;
    }
    if a_max <= 0.0 {
        return length / v_max.max(1e-9);
    }

    let v_peak_sq = a_max * length + 0.5 * (v_entry * v_entry + v_exit * v_exit);
    let v_peak = v_max.min(v_peak_sq.max(0.0).sqrt());
    if v_peak <= 0.0 {
        return 0.0;
    }

    let s_accel = ((v_peak * v_peak - v_entry * v_entry) / (2.0 * a_max)).max(0.0);
    let s_decel = ((v_peak * v_peak - v_exit * v_exit) / (2.0 * a_max)).max(0.0);
    let s_cruise = (length - s_accel - s_decel).max(0.0);

    (v_peak - v_entry).max(0.0) / a_max
        + s_cruise / v_peak
        + (v_peak - v_exit).max(0.0) / a_max
}

/// Effective feedrate after penalising dense small segments.
///
/// Parts with many short segments never reach the nominal feedrate;
/// the penalty is linear in the short-segment ratio and floored at 30 %
/// of nominal.
pub fn effective_vmax(v_max: f64, short_segment_ratio: f64) -> f64 {
    let ratio = short_segment_ratio.clamp(0.0, 1.0);
    (MIN_EFFECTIVE_VMAX_FRACTION * v_max).max(v_max * (1.0 - SHORT_SEGMENT_PENALTY * ratio))
}

/// Cut time for a single contour, planned from rest to rest [s].
pub fn contour_time(contour: &ContourMotion, v_max: f64, profile: &MachineProfile) -> f64 {
    let lengths = &contour.lengths_mm;
    let n = lengths.len();
    if n == 0 {
        return 0.0;
    }

    let a_max = profile.max_accel_mm_s2;
    let model = profile.corner_model();

    let mut limits = Vec::with_capacity(n + 1);
    limits.push(0.0);
    for k in 0..n - 1 {
        // Unknown angles (mismatched input lengths) plan conservatively
        // as square corners
        let angle = contour.junction_angles_deg.get(k).copied().unwrap_or(90.0);
        limits.push(junction_speed_limit(angle, v_max, a_max, &model));
    }
    limits.push(0.0);

    let planned = plan_junction_speeds(lengths, &limits, v_max, a_max);

    lengths
        .iter()
        .enumerate()
        .map(|(i, &length)| trapezoid_time(length, planned[i], planned[i + 1], v_max, a_max))
        .sum()
}

/// Cut time for a part's full toolpath [s].
///
/// `v_max` is the effective feedrate for the sheet (see
/// [`effective_vmax`]); each contour is planned independently.
pub fn part_cut_time(inputs: &MotionInputs, v_max: f64, profile: &MachineProfile) -> f64 {
    inputs
        .contours
        .iter()
        .map(|contour| contour_time(contour, v_max, profile))
        .sum()
}

/// Heuristic cut-time estimate when no motion inputs are available.
///
/// Assumes an average segment of 20 mm and a corner every 50 mm, adds
/// one full acceleration ramp per pierce. `v_max` is the effective
/// feedrate; pierce dwell time is not included.
pub fn estimate_time_heuristic(
    cut_length_mm: f64,
    pierce_count: usize,
    v_max: f64,
    profile: &MachineProfile,
) -> f64 {
    if cut_length_mm <= 0.0 || v_max <= 0.0 {
        return 0.0;
    }

    const AVG_SEGMENT_MM: f64 = 20.0;
    const CORNERS_PER_MM: f64 = 1.0 / 50.0;

    let straight_time = cut_length_mm / v_max;

    let accel_overhead = if profile.max_accel_mm_s2 > 0.0 {
        pierce_count as f64 * v_max / profile.max_accel_mm_s2
    } else {
        0.0
    };

    let corner_count = cut_length_mm * CORNERS_PER_MM;
    let corner_reduction =
        ((v_max - profile.square_corner_velocity_mm_s) / v_max).max(0.0);
    let corner_overhead = corner_count * (AVG_SEGMENT_MM / v_max) * corner_reduction * 0.5;

    straight_time + accel_overhead + corner_overhead
}
