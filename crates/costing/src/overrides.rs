//! Job-level cost overrides.

use crate::model::SourceType;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Material cost allocation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AllocationModel {
    /// Allocate by occupied footprint (recommended).
    #[default]
    OccupiedArea,
    /// Divide the per-area cost by the utilization factor. Kept for
    /// comparison with historical quotes only.
    LegacyUtilization,
}

/// Tri-state foil-removal override. `Auto` follows the rate book's
/// stainless-like marking and thickness cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FoilOverride {
    /// Rate book decides.
    #[default]
    Auto,
    /// Always remove foil.
    Include,
    /// Never remove foil.
    Exclude,
}

/// Per-job cost settings. The option set is closed; new flags require
/// schema evolution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JobOverrides {
    /// Whether the job is an order or a quotation.
    pub source_type: SourceType,

    /// Order or quotation id the overrides belong to.
    pub source_id: String,

    /// One-off technology/setup cost [PLN].
    pub tech_cost_pln: f64,

    /// Packaging cost [PLN].
    pub packaging_cost_pln: f64,

    /// Transport cost [PLN].
    pub transport_cost_pln: f64,

    /// Handling cost charged once per consumed sheet [PLN].
    pub operational_cost_per_sheet_pln: f64,

    /// Whether pierces are billed.
    pub include_piercing: bool,

    /// Foil-removal override.
    pub foil_removal: FoilOverride,

    /// Whether punch events are billed.
    pub include_punch: bool,

    /// Material allocation model.
    pub allocation_model: AllocationModel,

    /// Variant-B safety buffer on billed time. Values below 1.0 are
    /// permitted but flagged.
    pub buffer_factor: f64,

    /// Percentage markup on each variant's subtotal.
    pub margin_percent: f64,
}

impl Default for JobOverrides {
    fn default() -> Self {
        Self {
            source_type: SourceType::Order,
            source_id: String::new(),
            tech_cost_pln: 0.0,
            packaging_cost_pln: 0.0,
            transport_cost_pln: 0.0,
            operational_cost_per_sheet_pln: 40.0,
            include_piercing: true,
            foil_removal: FoilOverride::Auto,
            include_punch: false,
            allocation_model: AllocationModel::OccupiedArea,
            buffer_factor: 1.25,
            margin_percent: 0.0,
        }
    }
}

impl JobOverrides {
    /// Creates overrides with the default settings.
    pub fn new(source_type: SourceType, source_id: impl Into<String>) -> Self {
        Self {
            source_type,
            source_id: source_id.into(),
            ..Self::default()
        }
    }

    /// Sets the per-job pass-through costs [PLN].
    pub fn with_job_costs(mut self, tech: f64, packaging: f64, transport: f64) -> Self {
        self.tech_cost_pln = tech;
        self.packaging_cost_pln = packaging;
        self.transport_cost_pln = transport;
        self
    }

    /// Sets the per-sheet operational cost [PLN].
    pub fn with_operational_cost(mut self, pln_per_sheet: f64) -> Self {
        self.operational_cost_per_sheet_pln = pln_per_sheet;
        self
    }

    /// Enables or disables pierce billing.
    pub fn with_piercing(mut self, include: bool) -> Self {
        self.include_piercing = include;
        self
    }

    /// Sets the foil-removal override.
    pub fn with_foil_removal(mut self, foil: FoilOverride) -> Self {
        self.foil_removal = foil;
        self
    }

    /// Enables or disables punch billing.
    pub fn with_punch(mut self, include: bool) -> Self {
        self.include_punch = include;
        self
    }

    /// Sets the allocation model.
    pub fn with_allocation_model(mut self, model: AllocationModel) -> Self {
        self.allocation_model = model;
        self
    }

    /// Sets the variant-B buffer factor.
    pub fn with_buffer_factor(mut self, factor: f64) -> Self {
        self.buffer_factor = factor;
        self
    }

    /// Sets the percentage markup.
    pub fn with_margin_percent(mut self, percent: f64) -> Self {
        self.margin_percent = percent;
        self
    }

    /// Sum of the per-job pass-through costs [PLN].
    pub fn job_costs_total(&self) -> f64 {
        self.tech_cost_pln + self.packaging_cost_pln + self.transport_cost_pln
    }
}
