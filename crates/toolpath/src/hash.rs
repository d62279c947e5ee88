//! Content-addressed drawing hashing.
//!
//! SHA-256 over the canonicalised segment list: coordinates rounded to
//! 0.001 mm, contours ordered by their lowest rounded point, segments
//! kept in cut order within each contour. The same drawing bytes always
//! produce the same hash.

use sha2::{Digest, Sha256};

use nestcost_geometry::{Contour, Point};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rounding quantum for canonical coordinates: 0.001 mm.
const COORD_QUANTUM_MM: f64 = 0.001;

/// SHA-256 digest of a drawing's canonical segment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DrawingHash([u8; 32]);

impl DrawingHash {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering of the digest.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for DrawingHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Coordinate rounded to the canonical 0.001 mm grid.
fn quantise(v: f64) -> i64 {
    (v / COORD_QUANTUM_MM).round() as i64
}

fn canonical_point(p: &Point) -> (i64, i64) {
    (quantise(p.x), quantise(p.y))
}

/// Hashes a set of extracted contours.
pub fn hash_contours(contours: &[Contour]) -> DrawingHash {
    // Canonical order: contours sorted by their lexicographically
    // smallest rounded point; segment order within a contour is the cut
    // order and is preserved.
    let mut keyed: Vec<(Option<(i64, i64)>, &Contour)> = contours
        .iter()
        .map(|c| (c.points().iter().map(canonical_point).min(), c))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Sha256::new();
    for (_, contour) in keyed {
        hasher.update([u8::from(contour.is_closed())]);
        for segment in contour.segments() {
            for (x, y) in [
                canonical_point(&segment.start),
                canonical_point(&segment.end),
            ] {
                hasher.update(x.to_le_bytes());
                hasher.update(y.to_le_bytes());
            }
        }
        // Contour terminator so segment lists cannot run together
        hasher.update(i64::MIN.to_le_bytes());
    }

    DrawingHash(hasher.finalize().into())
}
