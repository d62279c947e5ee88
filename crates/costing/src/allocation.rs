//! Sheet billing area and material cost allocation.
//!
//! Cut-to-length sheets bill the trimmed strip unless the 94 % rule
//! fires: an off-cut shorter than 6 % of nominal length is unusable
//! scrap, so the full sheet is billed. Sheet cost then divides onto
//! parts by occupied footprint (default) or, for comparison with
//! historical quotes, through the legacy utilization factor.

use nestcost_core::units::{mm2_to_m2, thickness_mm_to_m};

use crate::model::{PartInstance, Sheet, SheetMode};
use crate::overrides::AllocationModel;
use crate::rates::{MaterialPrice, RateEntry};

/// Used-length ratio at or above which a cut-to-length sheet is billed
/// as a full sheet.
pub const FULL_SHEET_THRESHOLD: f64 = 0.94;

/// Sheet area the customer is billed for [mm²].
pub fn billed_sheet_area_mm2(sheet: &Sheet) -> f64 {
    match sheet.sheet_mode {
        SheetMode::FixedSheet => sheet.sheet_width_mm * sheet.sheet_length_mm_nominal,
        SheetMode::CutToLength => {
            let used_ratio = if sheet.sheet_length_mm_nominal > 0.0 {
                sheet.used_length_y_mm / sheet.sheet_length_mm_nominal
            } else {
                1.0
            };
            if used_ratio >= FULL_SHEET_THRESHOLD {
                sheet.sheet_width_mm * sheet.sheet_length_mm_nominal
            } else {
                sheet.sheet_width_mm * (sheet.used_length_y_mm + sheet.trim_margin_y_mm)
            }
        }
    }
}

/// Cost of the billed sheet area under the entry's pricing basis [PLN].
pub fn sheet_material_cost_pln(sheet: &Sheet, entry: &RateEntry) -> f64 {
    let area_m2 = mm2_to_m2(billed_sheet_area_mm2(sheet));
    match entry.material_price {
        MaterialPrice::PerSquareMetre { pln_per_m2 } => area_m2 * pln_per_m2,
        MaterialPrice::PerKilogram { pln_per_kg } => {
            let mass_kg = area_m2 * thickness_mm_to_m(sheet.thickness_mm) * entry.density_kg_m3;
            mass_kg * pln_per_kg
        }
    }
}

/// Distributes `total` over `weights` proportionally.
///
/// The floating-point residual is folded into the largest weight (ties
/// broken by the smallest id) so the shares sum to `total` exactly and
/// the result is invariant under permutation. Zero weights fall back to
/// an equal split.
pub fn distribute_proportionally(total: f64, weights: &[f64], ids: &[&str]) -> Vec<f64> {
    debug_assert_eq!(weights.len(), ids.len());

    if weights.is_empty() {
        return Vec::new();
    }
    if total == 0.0 {
        return vec![0.0; weights.len()];
    }

    let weight_sum: f64 = weights.iter().sum();
    let mut shares: Vec<f64> = if weight_sum > 0.0 {
        weights.iter().map(|w| total * w / weight_sum).collect()
    } else {
        vec![total / weights.len() as f64; weights.len()]
    };

    let residual = total - shares.iter().sum::<f64>();
    if residual != 0.0 {
        let anchor = (0..weights.len())
            .max_by(|&a, &b| {
                weights[a]
                    .partial_cmp(&weights[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
                    // Larger weight wins; on ties the smaller id
                    .then_with(|| ids[b].cmp(ids[a]))
            })
            .unwrap();
        shares[anchor] += residual;
    }

    shares
}

/// Allocates a sheet's material cost onto its parts, aligned with
/// `sheet.parts`.
pub fn allocate_material_cost(
    sheet: &Sheet,
    sheet_cost_pln: f64,
    model: AllocationModel,
) -> Vec<f64> {
    let ids: Vec<&str> = sheet
        .parts
        .iter()
        .map(|p| p.instance_id.as_str())
        .collect();

    match model {
        AllocationModel::OccupiedArea => {
            let weights: Vec<f64> = sheet
                .parts
                .iter()
                .map(PartInstance::total_occupied_mm2)
                .collect();
            distribute_proportionally(sheet_cost_pln, &weights, &ids)
        }
        AllocationModel::LegacyUtilization => {
            if sheet.parts.is_empty() {
                return Vec::new();
            }
            let occupied_sum: f64 = sheet
                .parts
                .iter()
                .map(PartInstance::total_occupied_mm2)
                .sum();
            if sheet.sheet_area_used_mm2 <= 0.0 || occupied_sum <= 0.0 {
                let weights = vec![0.0; sheet.parts.len()];
                return distribute_proportionally(sheet_cost_pln, &weights, &ids);
            }

            // Low utilization inflates the per-part rate; the factors
            // cancel so the shares still sum to the sheet cost
            let utilization = occupied_sum / sheet.sheet_area_used_mm2;
            let cost_per_mm2 = sheet_cost_pln / sheet.sheet_area_used_mm2;

            let mut shares: Vec<f64> = sheet
                .parts
                .iter()
                .map(|p| p.total_occupied_mm2() * cost_per_mm2 / utilization)
                .collect();

            let residual = sheet_cost_pln - shares.iter().sum::<f64>();
            if residual != 0.0 {
                let anchor = shares
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(i, _)| i)
                    .unwrap();
                shares[anchor] += residual;
            }
            shares
        }
    }
}
