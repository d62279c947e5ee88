//! # Nestcost Costing
//!
//! Sheet allocation and the two-variant cost engine for laser-cut
//! sheet-metal work.
//!
//! A [`NestingResult`] (from the external nester) runs through
//! [`CostingEngine::compute`], which resolves toolpath stats, plans cut
//! times, applies the 94 % billing rule and produces a [`CostSummary`]
//! with per-sheet and per-part breakdowns under both pricing variants:
//!
//! - **Variant A** multiplies cut length by a PLN/m tariff
//! - **Variant B** multiplies buffered machine time by an hourly rate
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod allocation;
pub mod engine;
pub mod facade;
pub mod model;
pub mod overrides;
pub mod rates;
pub mod summary;

// Re-exports
pub use allocation::{
    allocate_material_cost, billed_sheet_area_mm2, distribute_proportionally,
    sheet_material_cost_pln, FULL_SHEET_THRESHOLD,
};
pub use engine::{compute_sheet, foil_applicable, ResolvedPart, SheetOutcome};
pub use facade::CostingEngine;
pub use model::{NestingResult, PartInstance, Sheet, SheetMode, SourceType};
pub use overrides::{AllocationModel, FoilOverride, JobOverrides};
pub use rates::{FoilCost, FoilRule, MaterialPrice, RateBook, RateEntry};
pub use summary::{
    CostSummary, JobCosts, PartCost, SheetCostA, SheetCostB, VariantSummary,
};
