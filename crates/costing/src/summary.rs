//! Cost summary types.

use std::collections::BTreeMap;

use nestcost_core::Warning;

use crate::overrides::AllocationModel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-job pass-through charges plus the margin line.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JobCosts {
    /// Technology/setup cost [PLN].
    pub tech_cost_pln: f64,
    /// Packaging cost [PLN].
    pub packaging_cost_pln: f64,
    /// Transport cost [PLN].
    pub transport_cost_pln: f64,
    /// Percentage markup computed on the variant subtotal [PLN].
    pub margin_pln: f64,
}

impl JobCosts {
    /// Sum of all job-level charges [PLN].
    pub fn total_pln(&self) -> f64 {
        self.tech_cost_pln + self.packaging_cost_pln + self.transport_cost_pln + self.margin_pln
    }
}

/// Variant-A (price-list) breakdown for one sheet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SheetCostA {
    /// Sheet this breakdown belongs to.
    pub sheet_id: String,
    /// Billed sheet material [PLN].
    pub material_pln: f64,
    /// Cut length times the PLN/m tariff.
    pub cut_pln: f64,
    /// Pierce count times the pierce cost.
    pub pierce_pln: f64,
    /// Foil removal, when applicable.
    pub foil_pln: f64,
    /// Punch events, when billed.
    pub punch_pln: f64,
    /// Per-sheet handling surcharge.
    pub operational_pln: f64,
    /// Sheet total [PLN].
    pub total_pln: f64,
}

/// Variant-B (time-based) breakdown for one sheet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SheetCostB {
    /// Sheet this breakdown belongs to.
    pub sheet_id: String,
    /// Billed sheet material [PLN].
    pub material_pln: f64,
    /// Buffered machine time at the hourly rate [PLN].
    pub laser_pln: f64,
    /// Per-sheet handling surcharge.
    pub operational_pln: f64,
    /// Sheet total [PLN].
    pub total_pln: f64,
    /// Planned cutting time [s].
    pub cut_time_s: f64,
    /// Pierce dwell time [s].
    pub pierce_time_s: f64,
    /// Foil removal time [s].
    pub foil_time_s: f64,
    /// cut + pierce + foil [s].
    pub raw_time_s: f64,
    /// raw time times the buffer factor [s].
    pub billed_time_s: f64,
}

/// One variant's totals and per-sheet breakdowns.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariantSummary<S> {
    /// Run total including job costs [PLN].
    pub total_pln: f64,
    /// Per-sheet breakdowns.
    pub sheets: Vec<S>,
    /// Job-level charges.
    pub job_costs: JobCosts,
}

/// Cost attribution for one part instance. The variant totals include
/// the instance's share of job-level charges, so per-part totals sum
/// exactly to the variant totals.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartCost {
    /// Catalogue part id.
    pub part_id: String,
    /// Placement id.
    pub instance_id: String,
    /// Allocated sheet material [PLN].
    pub material_pln: f64,
    /// Variant-A cut share [PLN].
    pub cut_a_pln: f64,
    /// Variant-B cut share of the laser cost [PLN].
    pub cut_b_pln: f64,
    /// Variant-A pierce share [PLN].
    pub pierce_a_pln: f64,
    /// Variant-B pierce share of the laser cost [PLN].
    pub pierce_b_pln: f64,
    /// Variant-A foil share [PLN].
    pub foil_a_pln: f64,
    /// Variant-B foil share of the laser cost [PLN].
    pub foil_b_pln: f64,
    /// Variant-A punch share [PLN].
    pub punch_a_pln: f64,
    /// Share of the per-sheet operational surcharge [PLN].
    pub operational_pln: f64,
    /// Share of variant-A job-level charges [PLN].
    pub job_a_pln: f64,
    /// Share of variant-B job-level charges [PLN].
    pub job_b_pln: f64,
}

impl PartCost {
    /// Variant-A total for this instance [PLN].
    pub fn total_a_pln(&self) -> f64 {
        self.material_pln
            + self.cut_a_pln
            + self.pierce_a_pln
            + self.foil_a_pln
            + self.punch_a_pln
            + self.operational_pln
            + self.job_a_pln
    }

    /// Variant-B total for this instance [PLN].
    pub fn total_b_pln(&self) -> f64 {
        self.material_pln
            + self.cut_b_pln
            + self.pierce_b_pln
            + self.foil_b_pln
            + self.operational_pln
            + self.job_b_pln
    }
}

/// Complete costing output: a pure function of the nesting result,
/// overrides, rate book and machine profile.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CostSummary {
    /// Allocation model the run used.
    pub allocation_model: AllocationModel,
    /// Variant-B buffer factor.
    pub buffer_factor: f64,
    /// Machine profile the times were planned with.
    pub machine_profile_id: String,
    /// Price-list variant.
    pub variant_a: VariantSummary<SheetCostA>,
    /// Time-based variant.
    pub variant_b: VariantSummary<SheetCostB>,
    /// Attribution per part instance, keyed by instance id.
    pub per_part: BTreeMap<String, PartCost>,
    /// Non-fatal conditions collected during the run.
    pub warnings: Vec<Warning>,
    /// Wall-clock computation time [ms].
    pub computation_time_ms: u64,
}
