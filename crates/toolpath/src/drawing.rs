//! Drawings and the external drawing source contract.

use nestcost_core::Result;
use nestcost_geometry::{Point, Primitive};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A decoded vector drawing: a set of primitives plus their origin.
///
/// Decoding drawing files is the job of an external reader; the engine
/// only sees primitives.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Drawing {
    /// External identifier the drawing is fetched by.
    pub id: String,
    /// Drawing origin [mm].
    pub origin: Point,
    /// Drawing contents.
    pub primitives: Vec<Primitive>,
}

impl Drawing {
    /// Creates a drawing at the default origin.
    pub fn new(id: impl Into<String>, primitives: Vec<Primitive>) -> Self {
        Self {
            id: id.into(),
            origin: Point::default(),
            primitives,
        }
    }

    /// Sets the drawing origin.
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }
}

/// Supplier of decoded drawings, invoked only on a stats-cache miss.
pub trait DrawingSource: Send + Sync {
    /// Fetches the drawing with the given id.
    ///
    /// Implementations should return
    /// [`nestcost_core::Error::StatsMissing`] when the drawing is
    /// unavailable.
    fn fetch(&self, drawing_id: &str) -> Result<Drawing>;
}
