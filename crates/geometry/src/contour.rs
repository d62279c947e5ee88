//! Contours: ordered point paths with closure detection and stitching.

use geo::{Area, BoundingRect, Contains, LineString, Polygon as GeoPolygon};

use crate::point::Point;
use crate::segment::{path_junction_angles_deg, Segment};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Endpoints within this distance are unified when stitching primitives
/// into contours, and a path whose endpoints coincide within it is
/// closed [mm].
pub const STITCH_TOLERANCE_MM: f64 = 0.1;

/// Consecutive points closer than this are merged before statistics [mm].
pub const MERGE_TOLERANCE_MM: f64 = 0.01;

/// An ordered sequence of points forming an open path or a closed loop.
///
/// Closed contours store each vertex once; the closing segment back to
/// the first point is implicit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contour {
    points: Vec<Point>,
    closed: bool,
}

impl Contour {
    /// Builds a contour from an ordered path.
    ///
    /// Consecutive near-duplicate points (within
    /// [`MERGE_TOLERANCE_MM`]) are merged; a path whose endpoints
    /// coincide within [`STITCH_TOLERANCE_MM`] becomes a closed loop.
    /// Returns `None` when fewer than two distinct points remain.
    pub fn from_path(points: Vec<Point>) -> Option<Self> {
        let mut merged: Vec<Point> = Vec::with_capacity(points.len());
        for p in points {
            if merged
                .last()
                .is_some_and(|last| last.coincides(&p, MERGE_TOLERANCE_MM))
            {
                continue;
            }
            merged.push(p);
        }

        if merged.len() < 2 {
            return None;
        }

        let endpoints_meet = merged
            .first()
            .unwrap()
            .coincides(merged.last().unwrap(), STITCH_TOLERANCE_MM);

        if endpoints_meet && merged.len() >= 4 {
            merged.pop();
            Some(Self {
                points: merged,
                closed: true,
            })
        } else {
            Some(Self {
                points: merged,
                closed: false,
            })
        }
    }

    /// Whether the contour is a closed loop.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The contour vertices. Closed contours do not repeat the first
    /// point at the end.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The contour as segments in cut order, including the implicit
    /// closing segment for closed contours.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self
            .points
            .windows(2)
            .map(|w| Segment::new(w[0], w[1]))
            .collect();

        if self.closed && self.points.len() >= 2 {
            let last = *self.points.last().unwrap();
            let first = self.points[0];
            if !last.coincides(&first, MERGE_TOLERANCE_MM) {
                segments.push(Segment::new(last, first));
            }
        }

        segments
    }

    /// Total path length [mm].
    pub fn length(&self) -> f64 {
        self.segments().iter().map(Segment::length).sum()
    }

    /// Enclosed area for closed contours, via the shoelace formula with
    /// the sign discarded [mm²]. Open contours have zero area.
    pub fn area(&self) -> f64 {
        if !self.closed {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }

    /// Axis-aligned bounding box.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let line = self.to_line_string();
        line.bounding_rect().map(|rect| BoundingBox {
            min: Point::new(rect.min().x, rect.min().y),
            max: Point::new(rect.max().x, rect.max().y),
        })
    }

    /// Interior junction angles at the internal endpoints, in cut order.
    /// The junction back at the start point is a rest point (pierce) and
    /// is not included.
    pub fn junction_angles_deg(&self) -> Vec<f64> {
        path_junction_angles_deg(&self.segments())
    }

    /// Whether a closed contour fully contains another contour's points.
    pub fn contains(&self, other: &Contour) -> bool {
        if !self.closed {
            return false;
        }
        let polygon = self.to_geo_polygon();
        other
            .points
            .iter()
            .all(|p| polygon.contains(&geo::Point::new(p.x, p.y)))
    }

    fn to_line_string(&self) -> LineString<f64> {
        LineString::from(
            self.points
                .iter()
                .map(|&p| geo::Coord::from(p))
                .collect::<Vec<geo::Coord<f64>>>(),
        )
    }

    fn to_geo_polygon(&self) -> GeoPolygon<f64> {
        GeoPolygon::new(self.to_line_string(), vec![])
    }
}

/// Axis-aligned bounding box in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    /// Lower-left corner.
    pub min: Point,
    /// Upper-right corner.
    pub max: Point,
}

impl BoundingBox {
    /// Whether this box contains `other` (touching edges count).
    pub fn contains(&self, other: &BoundingBox) -> bool {
        const EPS: f64 = 1e-6;
        self.min.x <= other.min.x + EPS
            && self.min.y <= other.min.y + EPS
            && self.max.x + EPS >= other.max.x
            && self.max.y + EPS >= other.max.y
    }

    /// Box width [mm].
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Box height [mm].
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Assembles flattened primitive paths into contours.
///
/// Paths that already close on themselves become contours directly;
/// open paths are chained end-to-end wherever endpoints coincide within
/// `tolerance`, reversing chains as needed.
pub fn stitch_paths(paths: Vec<Vec<Point>>, tolerance: f64) -> Vec<Contour> {
    let mut open: Vec<Vec<Point>> = Vec::new();
    let mut contours: Vec<Contour> = Vec::new();

    for path in paths {
        if path.len() < 2 {
            continue;
        }
        let self_closing =
            path.len() >= 4 && path.first().unwrap().coincides(path.last().unwrap(), tolerance);
        if self_closing {
            if let Some(contour) = Contour::from_path(path) {
                contours.push(contour);
            }
        } else {
            open.push(path);
        }
    }

    let mut used = vec![false; open.len()];

    for i in 0..open.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let mut chain = open[i].clone();

        // Extend the chain at its end until nothing connects
        let mut extended = true;
        while extended {
            extended = false;
            let chain_end = *chain.last().unwrap();
            for (j, candidate) in open.iter().enumerate() {
                if used[j] {
                    continue;
                }
                if chain_end.coincides(candidate.first().unwrap(), tolerance) {
                    chain.extend(candidate.iter().skip(1).copied());
                    used[j] = true;
                    extended = true;
                    break;
                }
                if chain_end.coincides(candidate.last().unwrap(), tolerance) {
                    chain.extend(candidate.iter().rev().skip(1).copied());
                    used[j] = true;
                    extended = true;
                    break;
                }
            }
        }

        if let Some(contour) = Contour::from_path(chain) {
            contours.push(contour);
        }
    }

    contours
}
