//! # Nestcost
//!
//! Costing engine for laser-cut sheet-metal manufacturing.
//!
//! Given a nesting result (sheets with placed parts), the engine
//! derives toolpath statistics per drawing, estimates cut time with a
//! lookahead motion planner, allocates sheet material by occupied area
//! under the 94 % billing rule, and prices everything under two
//! variants: a PLN/m tariff (A) and buffered machine time at an hourly
//! rate (B).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nestcost::costing::{CostingEngine, JobOverrides, RateBook};
//! use nestcost::core::MachineProfile;
//!
//! let book = RateBook::with_defaults();
//! let profile = MachineProfile::new("fiber-6kw");
//!
//! let engine = CostingEngine::new(&book, &profile);
//! let summary = engine.compute(&nesting_result, &JobOverrides::default())?;
//! println!("variant A: {:.2} PLN", summary.variant_a.total_pln);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialization support across all types

/// Shared types: errors, units, machine profile.
pub use nestcost_core as core;

/// Geometry primitives and tessellation.
pub use nestcost_geometry as geometry;

/// Toolpath extraction and the stats cache.
pub use nestcost_toolpath as toolpath;

/// Lookahead cut-time estimation.
pub use nestcost_motion as motion;

/// Sheet allocation and cost composition.
pub use nestcost_costing as costing;

// Re-export commonly used types at root level
pub use nestcost_core::{Error, MachineProfile, Result, Warning};
pub use nestcost_costing::{
    CostSummary, CostingEngine, JobOverrides, NestingResult, RateBook,
};
