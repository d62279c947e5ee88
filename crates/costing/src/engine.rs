//! Per-sheet cost composition.
//!
//! Variant A prices cut length, pierces and foil against the rate
//! book's tariffs; variant B prices buffered machine time against the
//! hourly rate. Both variants share the material allocation and the
//! per-sheet operational surcharge, and both attribute every sheet-level
//! amount onto part instances so the shares sum exactly.

use nestcost_core::units::{m_min_to_mm_s, mm2_to_m2, mm_to_m};
use nestcost_core::MachineProfile;
use nestcost_motion::{effective_vmax, estimate_time_heuristic, part_cut_time};
use nestcost_toolpath::{MotionInputs, ToolpathStats};

use crate::allocation::{
    allocate_material_cost, billed_sheet_area_mm2, distribute_proportionally,
    sheet_material_cost_pln,
};
use crate::model::Sheet;
use crate::overrides::{FoilOverride, JobOverrides};
use crate::rates::{FoilCost, FoilRule, RateBook, RateEntry};
use crate::summary::{PartCost, SheetCostA, SheetCostB};

/// A part's toolpath data after resolution through snapshot, cache or
/// drawing source.
#[derive(Debug, Clone)]
pub struct ResolvedPart {
    /// Toolpath statistics.
    pub stats: ToolpathStats,
    /// Motion inputs for the lookahead planner, when available. Parts
    /// without them fall back to the heuristic estimate.
    pub motion: Option<MotionInputs>,
}

/// Whether foil removal applies to this sheet.
pub fn foil_applicable(book: &RateBook, entry: &RateEntry, overrides: &JobOverrides) -> bool {
    match overrides.foil_removal {
        FoilOverride::Exclude => false,
        FoilOverride::Include => book.foil.is_some(),
        FoilOverride::Auto => book.foil_auto_enabled(entry),
    }
}

/// Costs for one sheet under both variants, with per-part attribution
/// aligned to `sheet.parts`.
#[derive(Debug, Clone)]
pub struct SheetOutcome {
    /// Variant-A breakdown.
    pub a: SheetCostA,
    /// Variant-B breakdown.
    pub b: SheetCostB,
    /// Per-part attribution, aligned with the sheet's placements.
    pub parts: Vec<PartCost>,
}

/// Computes both cost variants for a sheet.
///
/// `resolved` must be aligned with `sheet.parts`.
pub fn compute_sheet(
    sheet: &Sheet,
    resolved: &[ResolvedPart],
    entry: &RateEntry,
    book: &RateBook,
    overrides: &JobOverrides,
    profile: &MachineProfile,
) -> SheetOutcome {
    debug_assert_eq!(sheet.parts.len(), resolved.len());

    let quantities: Vec<f64> = sheet.parts.iter().map(|p| p.qty_in_sheet as f64).collect();
    let ids: Vec<&str> = sheet
        .parts
        .iter()
        .map(|p| p.instance_id.as_str())
        .collect();

    // Quantity-weighted sheet totals
    let cut_weights: Vec<f64> = resolved
        .iter()
        .zip(&quantities)
        .map(|(r, qty)| r.stats.cut_length_mm * qty)
        .collect();
    let pierce_weights: Vec<f64> = resolved
        .iter()
        .zip(&quantities)
        .map(|(r, qty)| r.stats.pierce_count as f64 * qty)
        .collect();
    let occupied_weights: Vec<f64> = sheet
        .parts
        .iter()
        .map(|p| p.total_occupied_mm2())
        .collect();

    let total_cut_mm: f64 = cut_weights.iter().sum();
    let total_cut_m = mm_to_m(total_cut_mm);
    let total_pierces: f64 = pierce_weights.iter().sum();

    // Effective feedrate from the sheet's pooled short-segment ratio
    let pooled_short_ratio = if total_cut_mm > 0.0 {
        resolved
            .iter()
            .zip(&cut_weights)
            .map(|(r, w)| r.stats.short_segment_ratio * w)
            .sum::<f64>()
            / total_cut_mm
    } else {
        0.0
    };
    let v_nominal = m_min_to_mm_s(entry.cut_feedrate_m_min);
    let v_eff = effective_vmax(v_nominal, pooled_short_ratio);

    let cut_time_s: f64 = resolved
        .iter()
        .zip(&quantities)
        .map(|(r, qty)| {
            let per_piece = match &r.motion {
                Some(motion) => part_cut_time(motion, v_eff, profile),
                None => estimate_time_heuristic(
                    r.stats.cut_length_mm,
                    r.stats.pierce_count,
                    v_eff,
                    profile,
                ),
            };
            per_piece * qty
        })
        .sum();

    let pierce_time_s = if overrides.include_piercing {
        total_pierces * entry.pierce_time_s
    } else {
        0.0
    };

    let foil = if foil_applicable(book, entry, overrides) {
        book.foil.as_ref()
    } else {
        None
    };
    let foil_time_s = foil
        .map(|rule| total_cut_m / rule.speed_m_min * 60.0)
        .unwrap_or(0.0);

    // Material, shared by both variants
    let material_pln = sheet_material_cost_pln(sheet, entry);
    let material_shares = allocate_material_cost(sheet, material_pln, overrides.allocation_model);
    let operational_pln = overrides.operational_cost_per_sheet_pln;

    // Variant A: price list
    let cut_a_pln = total_cut_m * entry.cut_price_per_meter_pln;
    let pierce_a_pln = if overrides.include_piercing {
        total_pierces * entry.pierce_cost_pln.unwrap_or(0.0)
    } else {
        0.0
    };
    let foil_a_pln = foil
        .map(|rule| foil_cost_a(rule, total_cut_m, foil_time_s, sheet))
        .unwrap_or(0.0);
    let punch_a_pln = if overrides.include_punch {
        total_pierces * entry.punch_cost_per_punch_pln.unwrap_or(0.0)
    } else {
        0.0
    };

    let a = SheetCostA {
        sheet_id: sheet.sheet_id.clone(),
        material_pln,
        cut_pln: cut_a_pln,
        pierce_pln: pierce_a_pln,
        foil_pln: foil_a_pln,
        punch_pln: punch_a_pln,
        operational_pln,
        total_pln: material_pln + cut_a_pln + pierce_a_pln + foil_a_pln + punch_a_pln
            + operational_pln,
    };

    // Variant B: buffered time at the machine rate
    let raw_time_s = cut_time_s + pierce_time_s + foil_time_s;
    let billed_time_s = raw_time_s * overrides.buffer_factor;
    let laser_pln = billed_time_s / 3600.0 * entry.machine_rate_pln_per_hour;

    let b = SheetCostB {
        sheet_id: sheet.sheet_id.clone(),
        material_pln,
        laser_pln,
        operational_pln,
        total_pln: material_pln + laser_pln + operational_pln,
        cut_time_s,
        pierce_time_s,
        foil_time_s,
        raw_time_s,
        billed_time_s,
    };

    // Decompose the laser cost by time share so variant B attributes
    // along the same axes as variant A
    let (laser_cut, laser_pierce, laser_foil) = if raw_time_s > 0.0 {
        (
            laser_pln * cut_time_s / raw_time_s,
            laser_pln * pierce_time_s / raw_time_s,
            laser_pln * foil_time_s / raw_time_s,
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    let cut_a_shares = distribute_proportionally(cut_a_pln, &cut_weights, &ids);
    let cut_b_shares = distribute_proportionally(laser_cut, &cut_weights, &ids);
    let pierce_a_shares = distribute_proportionally(pierce_a_pln, &pierce_weights, &ids);
    let pierce_b_shares = distribute_proportionally(laser_pierce, &pierce_weights, &ids);
    let foil_a_shares = distribute_proportionally(foil_a_pln, &cut_weights, &ids);
    let foil_b_shares = distribute_proportionally(laser_foil, &cut_weights, &ids);
    let punch_a_shares = distribute_proportionally(punch_a_pln, &pierce_weights, &ids);
    let operational_shares = distribute_proportionally(operational_pln, &occupied_weights, &ids);

    let parts = sheet
        .parts
        .iter()
        .enumerate()
        .map(|(i, part)| PartCost {
            part_id: part.part_id.clone(),
            instance_id: part.instance_id.clone(),
            material_pln: material_shares[i],
            cut_a_pln: cut_a_shares[i],
            cut_b_pln: cut_b_shares[i],
            pierce_a_pln: pierce_a_shares[i],
            pierce_b_pln: pierce_b_shares[i],
            foil_a_pln: foil_a_shares[i],
            foil_b_pln: foil_b_shares[i],
            punch_a_pln: punch_a_shares[i],
            operational_pln: operational_shares[i],
            job_a_pln: 0.0,
            job_b_pln: 0.0,
        })
        .collect();

    SheetOutcome { a, b, parts }
}

fn foil_cost_a(rule: &FoilRule, total_cut_m: f64, foil_time_s: f64, sheet: &Sheet) -> f64 {
    match rule.cost {
        FoilCost::PerMetre { pln_per_m } => total_cut_m * pln_per_m,
        FoilCost::PerSquareMetre { pln_per_m2 } => {
            mm2_to_m2(billed_sheet_area_mm2(sheet)) * pln_per_m2
        }
        FoilCost::PerMinute { pln_per_min } => foil_time_s / 60.0 * pln_per_min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PartInstance;
    use crate::rates::MaterialPrice;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn stats(cut_mm: f64, pierces: usize) -> ToolpathStats {
        ToolpathStats {
            cut_length_mm: cut_mm,
            pierce_count: pierces,
            contour_count: pierces,
            open_contour_count: 0,
            short_segment_ratio: 0.0,
            occupied_area_mm2: 0.0,
            net_area_mm2: 0.0,
            entity_counts: BTreeMap::new(),
        }
    }

    fn resolved(cut_mm: f64, pierces: usize) -> ResolvedPart {
        ResolvedPart {
            stats: stats(cut_mm, pierces),
            motion: None,
        }
    }

    fn stainless_entry() -> RateEntry {
        RateEntry::new(
            "1.4301",
            2.0,
            7900.0,
            MaterialPrice::PerSquareMetre { pln_per_m2: 150.0 },
        )
        .with_feedrate(5.0)
        .with_cut_price(2.0)
        .with_machine_rate(350.0)
        .with_pierce(0.5, 0.25)
        .stainless()
    }

    fn one_part_sheet(cut_mm: f64, pierces: usize) -> (Sheet, Vec<ResolvedPart>) {
        let sheet = Sheet::new("SH-1", "1.4301", 2.0, 1500.0, 3000.0)
            .with_part(PartInstance::new("P1", "i1", "d1").with_occupied_area(1_000_000.0));
        (sheet, vec![resolved(cut_mm, pierces)])
    }

    #[test]
    fn test_foil_time_matches_speed() {
        // 10 m of cut at 15 m/min removal -> 40 s of foil time
        let (sheet, resolved) = one_part_sheet(10_000.0, 4);
        let book = RateBook::with_defaults();
        let entry = stainless_entry();
        let outcome = compute_sheet(
            &sheet,
            &resolved,
            &entry,
            &book,
            &JobOverrides::default(),
            &MachineProfile::default(),
        );
        assert_relative_eq!(outcome.b.foil_time_s, 40.0, epsilon = 1e-9);
        assert!(outcome.b.raw_time_s > 40.0);
    }

    #[test]
    fn test_foil_exclude_override() {
        let (sheet, resolved) = one_part_sheet(10_000.0, 4);
        let book = RateBook::with_defaults();
        let entry = stainless_entry();
        let overrides = JobOverrides::default().with_foil_removal(FoilOverride::Exclude);
        let outcome = compute_sheet(
            &sheet,
            &resolved,
            &entry,
            &book,
            &overrides,
            &MachineProfile::default(),
        );
        assert_eq!(outcome.b.foil_time_s, 0.0);
        assert_eq!(outcome.a.foil_pln, 0.0);
    }

    #[test]
    fn test_buffer_linearity() {
        let (sheet, resolved) = one_part_sheet(5000.0, 3);
        let book = RateBook::with_defaults();
        let entry = stainless_entry();
        let profile = MachineProfile::default();

        let base = compute_sheet(
            &sheet,
            &resolved,
            &entry,
            &book,
            &JobOverrides::default().with_buffer_factor(1.25),
            &profile,
        );
        let doubled = compute_sheet(
            &sheet,
            &resolved,
            &entry,
            &book,
            &JobOverrides::default().with_buffer_factor(2.5),
            &profile,
        );
        assert_relative_eq!(doubled.b.laser_pln, 2.0 * base.b.laser_pln, epsilon = 1e-9);
        // Raw time is unaffected by the buffer
        assert_relative_eq!(doubled.b.raw_time_s, base.b.raw_time_s, epsilon = 1e-12);
    }

    #[test]
    fn test_pierce_shares_follow_counts() {
        // Three parts, equal cut lengths, pierce counts 2/3/5: pierce
        // cost splits 0.2 / 0.3 / 0.5
        let sheet = Sheet::new("SH-1", "1.4301", 2.0, 1500.0, 3000.0)
            .with_part(PartInstance::new("P1", "i1", "d1").with_occupied_area(1_000_000.0))
            .with_part(PartInstance::new("P2", "i2", "d2").with_occupied_area(1_000_000.0))
            .with_part(PartInstance::new("P3", "i3", "d3").with_occupied_area(1_000_000.0));
        let resolved = vec![
            resolved(2000.0, 2),
            resolved(2000.0, 3),
            resolved(2000.0, 5),
        ];
        let book = RateBook::with_defaults();
        let entry = stainless_entry();
        let outcome = compute_sheet(
            &sheet,
            &resolved,
            &entry,
            &book,
            &JobOverrides::default(),
            &MachineProfile::default(),
        );

        let total = outcome.a.pierce_pln;
        assert!(total > 0.0);
        assert_relative_eq!(outcome.parts[0].pierce_a_pln, total * 0.2, epsilon = 1e-9);
        assert_relative_eq!(outcome.parts[1].pierce_a_pln, total * 0.3, epsilon = 1e-9);
        assert_relative_eq!(outcome.parts[2].pierce_a_pln, total * 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_piercing_can_be_disabled() {
        let (sheet, resolved) = one_part_sheet(5000.0, 7);
        let book = RateBook::with_defaults();
        let entry = stainless_entry();
        let outcome = compute_sheet(
            &sheet,
            &resolved,
            &entry,
            &book,
            &JobOverrides::default().with_piercing(false),
            &MachineProfile::default(),
        );
        assert_eq!(outcome.a.pierce_pln, 0.0);
        assert_eq!(outcome.b.pierce_time_s, 0.0);
    }

    #[test]
    fn test_punch_requires_opt_in_and_rate() {
        let (sheet, resolved) = one_part_sheet(5000.0, 4);
        let book = RateBook::with_defaults();
        let entry = stainless_entry().with_punch_cost(0.8);

        let default_run = compute_sheet(
            &sheet,
            &resolved,
            &entry,
            &book,
            &JobOverrides::default(),
            &MachineProfile::default(),
        );
        assert_eq!(default_run.a.punch_pln, 0.0);

        let punched = compute_sheet(
            &sheet,
            &resolved,
            &entry,
            &book,
            &JobOverrides::default().with_punch(true),
            &MachineProfile::default(),
        );
        assert_relative_eq!(punched.a.punch_pln, 4.0 * 0.8, epsilon = 1e-9);
    }

    #[test]
    fn test_sheet_totals_are_component_sums() {
        let (sheet, resolved) = one_part_sheet(8000.0, 5);
        let book = RateBook::with_defaults();
        let entry = stainless_entry();
        let outcome = compute_sheet(
            &sheet,
            &resolved,
            &entry,
            &book,
            &JobOverrides::default(),
            &MachineProfile::default(),
        );

        let a = &outcome.a;
        assert_relative_eq!(
            a.total_pln,
            a.material_pln + a.cut_pln + a.pierce_pln + a.foil_pln + a.punch_pln
                + a.operational_pln,
            epsilon = 1e-9
        );
        let b = &outcome.b;
        assert_relative_eq!(
            b.total_pln,
            b.material_pln + b.laser_pln + b.operational_pln,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_part_attribution_sums_to_sheet_totals() {
        let sheet = Sheet::new("SH-1", "1.4301", 2.0, 1500.0, 3000.0)
            .with_part(PartInstance::new("P1", "i1", "d1").with_occupied_area(600_000.0))
            .with_part(
                PartInstance::new("P2", "i2", "d2")
                    .with_occupied_area(250_000.0)
                    .with_qty(3),
            );
        let resolved = vec![resolved(4000.0, 2), resolved(1500.0, 4)];
        let book = RateBook::with_defaults();
        let entry = stainless_entry();
        let outcome = compute_sheet(
            &sheet,
            &resolved,
            &entry,
            &book,
            &JobOverrides::default(),
            &MachineProfile::default(),
        );

        let total_a: f64 = outcome.parts.iter().map(PartCost::total_a_pln).sum();
        let total_b: f64 = outcome.parts.iter().map(PartCost::total_b_pln).sum();
        assert_relative_eq!(total_a, outcome.a.total_pln, epsilon = 1e-6);
        assert_relative_eq!(total_b, outcome.b.total_pln, epsilon = 1e-6);

        let material: f64 = outcome.parts.iter().map(|p| p.material_pln).sum();
        assert_relative_eq!(material, outcome.a.material_pln, epsilon = 0.01);
    }

    #[test]
    fn test_short_segments_slow_the_sheet() {
        let (sheet, mut fast) = one_part_sheet(5000.0, 1);
        let mut slow = fast.clone();
        fast[0].stats.short_segment_ratio = 0.0;
        slow[0].stats.short_segment_ratio = 0.8;

        let book = RateBook::with_defaults();
        let entry = stainless_entry();
        let profile = MachineProfile::default();

        let fast_run = compute_sheet(
            &sheet,
            &fast,
            &entry,
            &book,
            &JobOverrides::default(),
            &profile,
        );
        let slow_run = compute_sheet(
            &sheet,
            &slow,
            &entry,
            &book,
            &JobOverrides::default(),
            &profile,
        );
        assert!(slow_run.b.cut_time_s > fast_run.b.cut_time_s);
    }
}
