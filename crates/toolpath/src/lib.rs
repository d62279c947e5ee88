//! # Nestcost Toolpath
//!
//! Toolpath statistics extraction and the content-addressed stats
//! cache.
//!
//! A drawing (primitives) flattens to contours, which yield
//! [`ToolpathStats`] (cut length, pierce count, short-segment ratio,
//! occupied area) and per-contour [`MotionInputs`] for the lookahead
//! planner. Results are memoised under a SHA-256 content hash so a
//! drawing is only ever analysed once per tessellation tolerance.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod cache;
pub mod drawing;
pub mod extractor;
pub mod hash;
pub mod stats;

// Re-exports
pub use cache::{resolve_stats, CacheKey, CachedToolpath, MemoryStatsCache, StatsCache};
pub use drawing::{Drawing, DrawingSource};
pub use extractor::{extract, extract_contours, Extraction, ExtractorConfig};
pub use hash::{hash_contours, DrawingHash};
pub use stats::{ContourMotion, MotionInputs, ToolpathStats, SHORT_SEGMENT_THRESHOLD_MM};
