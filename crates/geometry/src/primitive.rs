//! Drawing primitives and chord-tolerance tessellation.
//!
//! Every primitive flattens to an ordered polyline. Arcs subdivide so
//! the chord error stays below the tessellation tolerance
//! (`θ_max = 2·acos(1 − tol/r)`), polyline bulges use the DXF
//! `tan(θ/4)` construction, and splines refine adaptively until the
//! sampled path meets the same tolerance.

use crate::point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default chord tolerance for arc/spline flattening [mm].
pub const DEFAULT_CHORD_TOLERANCE_MM: f64 = 0.1;

/// Clamps a chord tolerance to the supported 0.05–0.2 mm range.
pub fn clamp_chord_tolerance(tolerance_mm: f64) -> f64 {
    tolerance_mm.clamp(0.05, 0.2)
}

/// A polyline vertex with an optional DXF-style bulge towards the next
/// vertex. `bulge = tan(sweep/4)`; zero means a straight edge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolyVertex {
    /// Vertex position.
    pub point: Point,
    /// Bulge factor of the edge leaving this vertex.
    pub bulge: f64,
}

impl PolyVertex {
    /// Creates a vertex with a straight outgoing edge.
    pub fn new(point: Point) -> Self {
        Self { point, bulge: 0.0 }
    }

    /// Creates a vertex with a bulged outgoing edge.
    pub fn with_bulge(point: Point, bulge: f64) -> Self {
        Self { point, bulge }
    }
}

/// A vector-drawing primitive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Primitive {
    /// Straight line.
    Line {
        /// Start point.
        start: Point,
        /// End point.
        end: Point,
    },
    /// Circular arc, angles in degrees, counter-clockwise from start to
    /// end.
    Arc {
        /// Arc centre.
        center: Point,
        /// Arc radius [mm].
        radius: f64,
        /// Start angle [deg].
        start_angle_deg: f64,
        /// End angle [deg].
        end_angle_deg: f64,
    },
    /// Full circle.
    Circle {
        /// Circle centre.
        center: Point,
        /// Circle radius [mm].
        radius: f64,
    },
    /// Polyline with optional bulged edges.
    Polyline {
        /// Vertices in order.
        vertices: Vec<PolyVertex>,
        /// Whether the last vertex connects back to the first.
        closed: bool,
    },
    /// B-spline given by its control polygon.
    Spline {
        /// Control points.
        control_points: Vec<Point>,
        /// Spline degree (clamped to the control-point count).
        degree: usize,
    },
}

/// Primitive kind, for the diagnostic entity histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrimitiveKind {
    /// Straight line.
    Line,
    /// Circular arc.
    Arc,
    /// Full circle.
    Circle,
    /// Polyline.
    Polyline,
    /// B-spline.
    Spline,
}

impl PrimitiveKind {
    /// Stable name used as the histogram key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "LINE",
            Self::Arc => "ARC",
            Self::Circle => "CIRCLE",
            Self::Polyline => "POLYLINE",
            Self::Spline => "SPLINE",
        }
    }
}

impl Primitive {
    /// Returns the kind of this primitive.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Line { .. } => PrimitiveKind::Line,
            Self::Arc { .. } => PrimitiveKind::Arc,
            Self::Circle { .. } => PrimitiveKind::Circle,
            Self::Polyline { .. } => PrimitiveKind::Polyline,
            Self::Spline { .. } => PrimitiveKind::Spline,
        }
    }

    /// Flattens the primitive into an ordered polyline at the given
    /// chord tolerance. Closed primitives repeat their first point at
    /// the end so closure detection sees coinciding endpoints.
    pub fn flatten(&self, tolerance_mm: f64) -> Vec<Point> {
        let tol = clamp_chord_tolerance(tolerance_mm);
        match self {
            Self::Line { start, end } => vec![*start, *end],
            Self::Arc {
                center,
                radius,
                start_angle_deg,
                end_angle_deg,
            } => flatten_arc(*center, *radius, *start_angle_deg, *end_angle_deg, tol),
            Self::Circle { center, radius } => flatten_circle(*center, *radius, tol),
            Self::Polyline { vertices, closed } => flatten_polyline(vertices, *closed, tol),
            Self::Spline {
                control_points,
                degree,
            } => flatten_spline(control_points, *degree, tol),
        }
    }
}

/// Maximum subdivision sweep for a chord tolerance at a radius.
fn max_sweep_rad(radius: f64, tolerance_mm: f64) -> f64 {
    if tolerance_mm < radius {
        2.0 * (1.0 - tolerance_mm / radius).acos()
    } else {
        std::f64::consts::PI / 8.0
    }
}

fn flatten_arc(
    center: Point,
    radius: f64,
    start_angle_deg: f64,
    end_angle_deg: f64,
    tolerance_mm: f64,
) -> Vec<Point> {
    if radius <= 0.0 {
        return Vec::new();
    }

    let start = start_angle_deg.to_radians();
    let mut end = end_angle_deg.to_radians();
    while end <= start {
        end += std::f64::consts::TAU;
    }

    let sweep = end - start;
    let n = ((sweep / max_sweep_rad(radius, tolerance_mm)).ceil() as usize).max(1);
    let delta = sweep / n as f64;

    (0..=n)
        .map(|i| {
            let a = start + i as f64 * delta;
            Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

fn flatten_circle(center: Point, radius: f64, tolerance_mm: f64) -> Vec<Point> {
    if radius <= 0.0 {
        return Vec::new();
    }

    let n = ((std::f64::consts::TAU / max_sweep_rad(radius, tolerance_mm)).ceil() as usize).max(8);
    let delta = std::f64::consts::TAU / n as f64;

    let mut points: Vec<Point> = (0..n)
        .map(|i| {
            let a = i as f64 * delta;
            Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect();
    points.push(points[0]);
    points
}

fn flatten_polyline(vertices: &[PolyVertex], closed: bool, tolerance_mm: f64) -> Vec<Point> {
    if vertices.is_empty() {
        return Vec::new();
    }

    let mut points = vec![vertices[0].point];

    let edge_count = if closed {
        vertices.len()
    } else {
        vertices.len() - 1
    };

    for i in 0..edge_count {
        let from = vertices[i];
        let to = vertices[(i + 1) % vertices.len()].point;
        append_edge(&mut points, from.point, to, from.bulge, tolerance_mm);
    }

    points
}

/// Appends the edge `from → to` to `points`, expanding a bulge into arc
/// samples. `points` already ends at `from`.
fn append_edge(points: &mut Vec<Point>, from: Point, to: Point, bulge: f64, tolerance_mm: f64) {
    if bulge.abs() < 1e-9 {
        points.push(to);
        return;
    }

    let chord = from.distance(&to);
    if chord < 1e-9 {
        return;
    }

    // bulge = tan(sweep/4)
    let sweep = 4.0 * bulge.abs().atan();
    let sin_half = (sweep / 2.0).sin();
    if sin_half < 1e-9 {
        points.push(to);
        return;
    }

    let radius = chord / (2.0 * sin_half);
    let h = radius * (sweep / 2.0).cos();

    let chord_angle = (to.y - from.y).atan2(to.x - from.x);
    let perp = if bulge > 0.0 {
        chord_angle + std::f64::consts::FRAC_PI_2
    } else {
        chord_angle - std::f64::consts::FRAC_PI_2
    };

    let mid = Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
    let center = Point::new(mid.x + h * perp.cos(), mid.y + h * perp.sin());

    let start_angle = (from.y - center.y).atan2(from.x - center.x);
    let mut end_angle = (to.y - center.y).atan2(to.x - center.x);

    if bulge > 0.0 {
        while end_angle <= start_angle {
            end_angle += std::f64::consts::TAU;
        }
    } else {
        while end_angle >= start_angle {
            end_angle -= std::f64::consts::TAU;
        }
    }

    let n = (((end_angle - start_angle).abs() / max_sweep_rad(radius, tolerance_mm)).ceil()
        as usize)
        .max(1);
    let delta = (end_angle - start_angle) / n as f64;

    for i in 1..=n {
        let a = start_angle + i as f64 * delta;
        points.push(Point::new(
            center.x + radius * a.cos(),
            center.y + radius * a.sin(),
        ));
    }
}

fn flatten_spline(control_points: &[Point], degree: usize, tolerance_mm: f64) -> Vec<Point> {
    let n = control_points.len();
    if n < 2 {
        return control_points.to_vec();
    }

    let degree = degree.clamp(1, n - 1);
    let knots = clamped_uniform_knots(n, degree);

    let mut samples = (4 * n).max(16);
    loop {
        let points: Vec<Point> = (0..=samples)
            .map(|i| de_boor(control_points, degree, &knots, i as f64 / samples as f64))
            .collect();

        if samples >= 1024 || max_chord_deviation(&points) <= tolerance_mm {
            return points;
        }
        samples *= 2;
    }
}

/// Clamped uniform knot vector for `n` control points of `degree`.
fn clamped_uniform_knots(n: usize, degree: usize) -> Vec<f64> {
    let m = n + degree + 1;
    let inner = m - 2 * (degree + 1);
    (0..m)
        .map(|i| {
            if i <= degree {
                0.0
            } else if i >= m - degree - 1 {
                1.0
            } else {
                (i - degree) as f64 / (inner + 1) as f64
            }
        })
        .collect()
}

/// De Boor evaluation of a clamped B-spline at parameter `t ∈ [0, 1]`.
fn de_boor(control: &[Point], degree: usize, knots: &[f64], t: f64) -> Point {
    let n = control.len();
    let t = t.clamp(0.0, 1.0);

    // Knot span index, clamped so the last parameter stays valid.
    let mut k = degree;
    while k < n - 1 && t >= knots[k + 1] {
        k += 1;
    }

    let mut d: Vec<Point> = (0..=degree).map(|j| control[j + k - degree]).collect();

    for r in 1..=degree {
        for j in (r..=degree).rev() {
            let denom = knots[j + 1 + k - r] - knots[j + k - degree];
            let alpha = if denom.abs() < 1e-12 {
                0.0
            } else {
                (t - knots[j + k - degree]) / denom
            };
            d[j] = Point::new(
                (1.0 - alpha) * d[j - 1].x + alpha * d[j].x,
                (1.0 - alpha) * d[j - 1].y + alpha * d[j].y,
            );
        }
    }

    d[degree]
}

/// Largest perpendicular deviation of each interior sample from the
/// chord of its neighbours.
fn max_chord_deviation(points: &[Point]) -> f64 {
    let mut max_dev: f64 = 0.0;
    for w in points.windows(3) {
        let (a, b, c) = (w[0], w[1], w[2]);
        let chord = a.distance(&c);
        if chord < 1e-12 {
            continue;
        }
        let cross = ((c.x - a.x) * (a.y - b.y) - (a.x - b.x) * (c.y - a.y)).abs();
        max_dev = max_dev.max(cross / chord);
    }
    max_dev
}
