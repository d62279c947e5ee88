//! Content-addressed stats cache.
//!
//! Entries are keyed by drawing hash plus tessellation tolerance and
//! are immutable: concurrent misses only duplicate work, never corrupt
//! the cache.

use std::collections::HashMap;
use std::sync::RwLock;

use nestcost_core::{Result, Warning};

use crate::drawing::DrawingSource;
use crate::extractor::{extract_contours, extract_from_contours, ExtractorConfig};
use crate::hash::{hash_contours, DrawingHash};
use crate::stats::{MotionInputs, ToolpathStats};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cache key: content hash plus the tessellation tolerance the stats
/// were derived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CacheKey {
    /// Canonical drawing hash.
    pub drawing_hash: DrawingHash,
    /// Tessellation tolerance in micrometres.
    pub tolerance_um: u32,
}

impl CacheKey {
    /// Builds a key from a hash and a tolerance in millimetres.
    pub fn new(drawing_hash: DrawingHash, tolerance_mm: f64) -> Self {
        Self {
            drawing_hash,
            tolerance_um: (tolerance_mm * 1000.0).round() as u32,
        }
    }
}

/// Cached extraction output. Motion inputs are the optional Tier-2
/// payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CachedToolpath {
    /// Derived statistics.
    pub stats: ToolpathStats,
    /// Per-contour motion data, when the producer stored it.
    pub motion: Option<MotionInputs>,
}

/// Storage contract for the stats cache. The backing medium is an
/// external collaborator; this crate ships an in-memory implementation.
pub trait StatsCache: Send + Sync {
    /// Looks up a cached entry.
    fn get(&self, key: &CacheKey) -> Option<CachedToolpath>;

    /// Stores an entry. Entries are immutable; storing an existing key
    /// is a no-op for correctness purposes.
    fn put(&self, key: CacheKey, value: CachedToolpath);
}

/// In-memory stats cache: many readers, write-on-miss.
#[derive(Debug, Default)]
pub struct MemoryStatsCache {
    entries: RwLock<HashMap<CacheKey, CachedToolpath>>,
}

impl MemoryStatsCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatsCache for MemoryStatsCache {
    fn get(&self, key: &CacheKey) -> Option<CachedToolpath> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: CacheKey, value: CachedToolpath) {
        if let Ok(mut entries) = self.entries.write() {
            entries.entry(key).or_insert(value);
        }
    }
}

/// Resolves stats for a drawing id through the cache.
///
/// On a hit the drawing is not fetched. On a miss the drawing comes
/// from `source`, is extracted, and the result is stored under its
/// content hash before being returned together with any extraction
/// warnings.
pub fn resolve_stats(
    drawing_id: &str,
    known_key: Option<CacheKey>,
    cache: &dyn StatsCache,
    source: &dyn DrawingSource,
    config: &ExtractorConfig,
) -> Result<(CachedToolpath, Vec<Warning>)> {
    if let Some(key) = known_key {
        if let Some(hit) = cache.get(&key) {
            return Ok((hit, Vec::new()));
        }
    }

    let drawing = source.fetch(drawing_id)?;
    let contours = extract_contours(&drawing, config);
    let key = CacheKey::new(hash_contours(&contours), config.effective_tolerance());

    if let Some(hit) = cache.get(&key) {
        return Ok((hit, Vec::new()));
    }

    let extraction = extract_from_contours(&drawing, &contours)?;
    let cached = CachedToolpath {
        stats: extraction.stats,
        motion: Some(extraction.motion),
    };
    cache.put(key, cached.clone());

    Ok((cached, extraction.warnings))
}
