//! End-to-end tests for the costing engine.
//!
//! Exercises the full pipeline (nesting result, rate resolution, motion
//! planning, allocation, cost summary) against literal scenario values
//! and the engine's conservation, permutation and monotonicity
//! properties.

use std::collections::BTreeMap;

use approx::assert_relative_eq;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

use nestcost_core::MachineProfile;
use nestcost_costing::{
    AllocationModel, CostingEngine, JobOverrides, MaterialPrice, NestingResult, PartCost,
    PartInstance, RateBook, RateEntry, Sheet, SourceType,
};
use nestcost_toolpath::{extract, ContourMotion, Drawing, ExtractorConfig, MotionInputs,
    ToolpathStats,
};

fn stats(cut_mm: f64, pierces: usize, short_ratio: f64) -> ToolpathStats {
    ToolpathStats {
        cut_length_mm: cut_mm,
        pierce_count: pierces,
        contour_count: pierces,
        open_contour_count: if pierces == 0 { 1 } else { 0 },
        short_segment_ratio: short_ratio,
        occupied_area_mm2: 0.0,
        net_area_mm2: 0.0,
        entity_counts: BTreeMap::new(),
    }
}

fn single_open_segment(length_mm: f64) -> MotionInputs {
    MotionInputs {
        contours: vec![ContourMotion {
            lengths_mm: vec![length_mm],
            junction_angles_deg: vec![],
        }],
    }
}

/// 300 m/min feedrate (5000 mm/s), 50 PLN/m² sheet, 350 PLN/h machine.
fn fast_steel_book() -> RateBook {
    RateBook::new().with_entry(
        RateEntry::new(
            "S235",
            3.0,
            7850.0,
            MaterialPrice::PerSquareMetre { pln_per_m2: 50.0 },
        )
        .with_feedrate(300.0)
        .with_cut_price(1.5)
        .with_machine_rate(350.0)
        .with_pierce(0.5, 0.2),
    )
}

fn profile() -> MachineProfile {
    // a_max = 2000 mm/s², v_corner_90 = 50 mm/s
    MachineProfile::new("fiber-6kw")
}

#[test]
fn scenario_long_straight_line() {
    // One open 1000 mm segment at 5000 mm/s nominal feed. The segment
    // is too short to reach the feedrate, so the profile is triangular:
    // v_peak = sqrt(a*L), t = 2*v_peak/a ~ 1.414 s.
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);

    let nesting = NestingResult::new(SourceType::Order, "S1")
        .with_machine_profile(machine.id.clone())
        .with_sheet(
            Sheet::new("SH-1", "S235", 3.0, 1500.0, 3000.0).with_part(
                PartInstance::new("P1", "i1", "d1")
                    .with_occupied_area(1_000_000.0)
                    .with_stats(stats(1000.0, 0, 0.0))
                    .with_motion(single_open_segment(1000.0)),
            ),
        );

    let summary = engine.compute(&nesting, &JobOverrides::default()).unwrap();
    let sheet_b = &summary.variant_b.sheets[0];

    let v_peak = (2000.0_f64 * 1000.0).sqrt();
    let expected_cut_time = 2.0 * v_peak / 2000.0;
    assert_relative_eq!(sheet_b.cut_time_s, expected_cut_time, epsilon = 1e-9);

    // No closed contour: no pierce time, and with plain steel no foil
    assert_eq!(sheet_b.pierce_time_s, 0.0);
    assert_eq!(sheet_b.foil_time_s, 0.0);
    assert_relative_eq!(
        sheet_b.billed_time_s,
        expected_cut_time * 1.25,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        sheet_b.laser_pln,
        expected_cut_time * 1.25 / 3600.0 * 350.0,
        epsilon = 1e-9
    );
}

#[test]
fn scenario_dense_lacy_part_cuts_slower() {
    // Same toolpath, short-segment ratio 0.5 vs 0.0: the effective
    // feedrate drops to 3250 mm/s and the cut takes strictly longer
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);

    // 20 m of straight cut: long enough for the feedrate cap to bind
    // (at 5000 mm/s the cruise phase dominates)
    let motion = single_open_segment(20_000.0);

    let build = |ratio: f64| {
        NestingResult::new(SourceType::Order, "S2").with_sheet(
            Sheet::new("SH-1", "S235", 3.0, 1500.0, 3000.0).with_part(
                PartInstance::new("P1", "i1", "d1")
                    .with_occupied_area(1_000_000.0)
                    .with_stats(stats(20_000.0, 0, ratio))
                    .with_motion(motion.clone()),
            ),
        )
    };

    let smooth = engine
        .compute(&build(0.0), &JobOverrides::default())
        .unwrap();
    let lacy = engine
        .compute(&build(0.5), &JobOverrides::default())
        .unwrap();

    assert!(lacy.variant_b.sheets[0].cut_time_s > smooth.variant_b.sheets[0].cut_time_s);
}

#[test]
fn scenario_occupied_area_allocation() {
    // 1500x3000 at 50 PLN/m² = 225 PLN, split 1:2 across two parts
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);

    let nesting = NestingResult::new(SourceType::Order, "S3").with_sheet(
        Sheet::new("SH-1", "S235", 3.0, 1500.0, 3000.0)
            .with_part(
                PartInstance::new("P1", "i1", "d1")
                    .with_occupied_area(1_000_000.0)
                    .with_stats(stats(2000.0, 1, 0.0)),
            )
            .with_part(
                PartInstance::new("P2", "i2", "d2")
                    .with_occupied_area(2_000_000.0)
                    .with_stats(stats(2000.0, 1, 0.0)),
            ),
    );

    let summary = engine.compute(&nesting, &JobOverrides::default()).unwrap();
    assert_relative_eq!(summary.variant_a.sheets[0].material_pln, 225.0, epsilon = 1e-9);
    assert_relative_eq!(summary.per_part["i1"].material_pln, 75.0, epsilon = 0.01);
    assert_relative_eq!(summary.per_part["i2"].material_pln, 150.0, epsilon = 0.01);
}

#[test]
fn scenario_94_percent_rule_boundary() {
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);

    let build = |used_length: f64| {
        NestingResult::new(SourceType::Order, "S4").with_sheet(
            Sheet::new("SH-1", "S235", 3.0, 1500.0, 3000.0)
                .with_cut_to_length(used_length)
                .with_part(
                    PartInstance::new("P1", "i1", "d1")
                        .with_occupied_area(1_000_000.0)
                        .with_stats(stats(2000.0, 1, 0.0)),
                ),
        )
    };

    // 2820 / 3000 = 0.94 exactly: the full nominal sheet is billed
    let at_threshold = engine
        .compute(&build(2820.0), &JobOverrides::default())
        .unwrap();
    assert_relative_eq!(
        at_threshold.variant_a.sheets[0].material_pln,
        4.5 * 50.0,
        epsilon = 1e-9
    );

    // 2819 / 3000 just misses: bill 1500 x (2819 + 10) mm²
    let below = engine
        .compute(&build(2819.0), &JobOverrides::default())
        .unwrap();
    assert_relative_eq!(
        below.variant_a.sheets[0].material_pln,
        4.2435 * 50.0,
        epsilon = 1e-9
    );
}

#[test]
fn scenario_foil_removal_time() {
    // Stainless 2 mm, 10 m of cut, foil at 15 m/min -> 40 s before
    // buffering
    let book = RateBook::with_defaults();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);

    let nesting = NestingResult::new(SourceType::Order, "S5").with_sheet(
        Sheet::new("SH-1", "1.4301", 2.0, 1500.0, 3000.0).with_part(
            PartInstance::new("P1", "i1", "d1")
                .with_occupied_area(1_000_000.0)
                .with_stats(stats(10_000.0, 4, 0.0)),
        ),
    );

    let summary = engine.compute(&nesting, &JobOverrides::default()).unwrap();
    assert_relative_eq!(summary.variant_b.sheets[0].foil_time_s, 40.0, epsilon = 1e-9);
}

#[test]
fn scenario_pierce_conservation() {
    // Pierce counts 2/3/5 with equal cut lengths: shares 0.2/0.3/0.5
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);

    let nesting = NestingResult::new(SourceType::Order, "S6").with_sheet(
        Sheet::new("SH-1", "S235", 3.0, 1500.0, 3000.0)
            .with_part(
                PartInstance::new("P1", "i1", "d1")
                    .with_occupied_area(1_000_000.0)
                    .with_stats(stats(3000.0, 2, 0.0)),
            )
            .with_part(
                PartInstance::new("P2", "i2", "d2")
                    .with_occupied_area(1_000_000.0)
                    .with_stats(stats(3000.0, 3, 0.0)),
            )
            .with_part(
                PartInstance::new("P3", "i3", "d3")
                    .with_occupied_area(1_000_000.0)
                    .with_stats(stats(3000.0, 5, 0.0)),
            ),
    );

    let summary = engine.compute(&nesting, &JobOverrides::default()).unwrap();
    let sheet_pierce = summary.variant_a.sheets[0].pierce_pln;
    assert!(sheet_pierce > 0.0);
    assert_relative_eq!(
        summary.per_part["i1"].pierce_a_pln,
        sheet_pierce * 0.2,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        summary.per_part["i2"].pierce_a_pln,
        sheet_pierce * 0.3,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        summary.per_part["i3"].pierce_a_pln,
        sheet_pierce * 0.5,
        epsilon = 1e-9
    );

    let sum: f64 = summary
        .per_part
        .values()
        .map(|p: &PartCost| p.pierce_a_pln)
        .sum();
    assert_relative_eq!(sum, sheet_pierce, epsilon = 1e-9);
}

fn mixed_nesting() -> NestingResult {
    let sheet1 = Sheet::new("SH-1", "S235", 3.0, 1500.0, 3000.0)
        .with_part(
            PartInstance::new("P1", "i1", "d1")
                .with_occupied_area(700_000.0)
                .with_stats(stats(4200.0, 2, 0.1)),
        )
        .with_part(
            PartInstance::new("P2", "i2", "d2")
                .with_occupied_area(1_200_000.0)
                .with_qty(2)
                .with_stats(stats(1800.0, 3, 0.3)),
        )
        .with_part(
            PartInstance::new("P3", "i3", "d3")
                .with_occupied_area(400_000.0)
                .with_stats(stats(950.0, 1, 0.0)),
        );
    let sheet2 = Sheet::new("SH-2", "S235", 3.0, 1500.0, 3000.0)
        .with_cut_to_length(1400.0)
        .with_part(
            PartInstance::new("P4", "i4", "d4")
                .with_occupied_area(900_000.0)
                .with_stats(stats(3100.0, 4, 0.2)),
        );

    NestingResult::new(SourceType::Order, "ORD-MIX")
        .with_machine_profile("fiber-6kw")
        .with_sheet(sheet1)
        .with_sheet(sheet2)
}

#[test]
fn property_material_conservation_per_sheet() {
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);
    let summary = engine.compute(&mixed_nesting(), &JobOverrides::default()).unwrap();

    let nesting = mixed_nesting();
    for (sheet, breakdown) in nesting.sheets.iter().zip(&summary.variant_a.sheets) {
        let allocated: f64 = sheet
            .parts
            .iter()
            .map(|p| summary.per_part[&p.instance_id].material_pln)
            .sum();
        assert!(
            (allocated - breakdown.material_pln).abs() <= 0.01,
            "sheet {} material drifted: {} vs {}",
            sheet.sheet_id,
            allocated,
            breakdown.material_pln
        );
    }
}

#[test]
fn property_operational_cost_conservation() {
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);
    let overrides = JobOverrides::default().with_operational_cost(40.0);
    let summary = engine.compute(&mixed_nesting(), &overrides).unwrap();

    let total_operational: f64 = summary.per_part.values().map(|p| p.operational_pln).sum();
    assert_relative_eq!(total_operational, 40.0 * 2.0, epsilon = 1e-9);
}

#[test]
fn property_permutation_invariance_within_sheet() {
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);
    let overrides = JobOverrides::default().with_job_costs(120.0, 40.0, 60.0);

    let baseline = engine.compute(&mixed_nesting(), &overrides).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..5 {
        let mut shuffled = mixed_nesting();
        for sheet in &mut shuffled.sheets {
            sheet.parts.shuffle(&mut rng);
        }
        let summary = engine.compute(&shuffled, &overrides).unwrap();

        for (id, part) in &baseline.per_part {
            let other = &summary.per_part[id];
            assert_relative_eq!(part.material_pln, other.material_pln, epsilon = 1e-9);
            assert_relative_eq!(part.cut_a_pln, other.cut_a_pln, epsilon = 1e-9);
            assert_relative_eq!(part.pierce_a_pln, other.pierce_a_pln, epsilon = 1e-9);
            assert_relative_eq!(part.operational_pln, other.operational_pln, epsilon = 1e-9);
            assert_relative_eq!(part.total_a_pln(), other.total_a_pln(), epsilon = 1e-9);
            assert_relative_eq!(part.total_b_pln(), other.total_b_pln(), epsilon = 1e-9);
        }
    }
}

#[test]
fn property_sheet_order_does_not_matter() {
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);

    let forward = engine.compute(&mixed_nesting(), &JobOverrides::default()).unwrap();

    let mut reversed_input = mixed_nesting();
    reversed_input.sheets.reverse();
    let reversed = engine.compute(&reversed_input, &JobOverrides::default()).unwrap();

    assert_relative_eq!(
        forward.variant_a.total_pln,
        reversed.variant_a.total_pln,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        forward.variant_b.total_pln,
        reversed.variant_b.total_pln,
        epsilon = 1e-9
    );
    for (id, part) in &forward.per_part {
        assert_relative_eq!(
            part.total_a_pln(),
            reversed.per_part[id].total_a_pln(),
            epsilon = 1e-9
        );
    }
}

#[test]
fn property_determinism_across_runs() {
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);
    let overrides = JobOverrides::default().with_margin_percent(8.0);

    let first = engine.compute(&mixed_nesting(), &overrides).unwrap();
    let second = engine.compute(&mixed_nesting(), &overrides).unwrap();

    assert_eq!(first.variant_a.total_pln, second.variant_a.total_pln);
    assert_eq!(first.variant_b.total_pln, second.variant_b.total_pln);
    assert_eq!(first.per_part, second.per_part);
    assert_eq!(first.warnings, second.warnings);
}

#[test]
fn property_feedrate_monotonicity_end_to_end() {
    // A faster feedrate never increases the sheet's cut time
    let machine = profile();
    let motion = MotionInputs {
        contours: vec![ContourMotion {
            lengths_mm: vec![60.0, 4.0, 110.0, 7.0],
            junction_angles_deg: vec![90.0, 120.0, 60.0],
        }],
    };

    let mut last = f64::INFINITY;
    for feedrate in [3.0, 10.0, 60.0, 300.0] {
        let book = RateBook::new().with_entry(
            RateEntry::new(
                "S235",
                3.0,
                7850.0,
                MaterialPrice::PerSquareMetre { pln_per_m2: 50.0 },
            )
            .with_feedrate(feedrate)
            .with_cut_price(1.5)
            .with_machine_rate(350.0)
            .with_pierce(0.5, 0.2),
        );
        let engine = CostingEngine::new(&book, &machine);
        let nesting = NestingResult::new(SourceType::Order, "MONO").with_sheet(
            Sheet::new("SH-1", "S235", 3.0, 1500.0, 3000.0).with_part(
                PartInstance::new("P1", "i1", "d1")
                    .with_occupied_area(500_000.0)
                    .with_stats(stats(181.0, 1, 0.1))
                    .with_motion(motion.clone()),
            ),
        );
        let summary = engine.compute(&nesting, &JobOverrides::default()).unwrap();
        let t = summary.variant_b.sheets[0].cut_time_s;
        assert!(t <= last + 1e-12);
        last = t;
    }
}

#[test]
fn property_buffer_linearity_end_to_end() {
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);

    let base = engine
        .compute(
            &mixed_nesting(),
            &JobOverrides::default().with_buffer_factor(1.0),
        )
        .unwrap();
    let doubled = engine
        .compute(
            &mixed_nesting(),
            &JobOverrides::default().with_buffer_factor(2.0),
        )
        .unwrap();

    for (b1, b2) in base.variant_b.sheets.iter().zip(&doubled.variant_b.sheets) {
        assert_relative_eq!(b2.laser_pln, 2.0 * b1.laser_pln, epsilon = 1e-9);
    }
}

#[test]
fn property_extraction_round_trip_is_bit_equal() {
    use nestcost_geometry::{Point, PolyVertex, Primitive};

    let drawing = Drawing::new(
        "round-trip",
        vec![
            Primitive::Polyline {
                vertices: vec![
                    PolyVertex::new(Point::new(0.0, 0.0)),
                    PolyVertex::new(Point::new(80.0, 0.0)),
                    PolyVertex::new(Point::new(80.0, 40.0)),
                    PolyVertex::new(Point::new(0.0, 40.0)),
                ],
                closed: true,
            },
            Primitive::Circle {
                center: Point::new(40.0, 20.0),
                radius: 8.0,
            },
            Primitive::Arc {
                center: Point::new(10.0, 10.0),
                radius: 4.0,
                start_angle_deg: 0.0,
                end_angle_deg: 180.0,
            },
        ],
    );

    let config = ExtractorConfig::default();
    let first = extract(&drawing, &config).unwrap();
    let second = extract(&drawing, &config).unwrap();
    assert_eq!(first.stats, second.stats);
    assert_eq!(first.motion, second.motion);
}

#[test]
fn legacy_allocation_is_opt_in_and_conserves() {
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);
    let overrides =
        JobOverrides::default().with_allocation_model(AllocationModel::LegacyUtilization);

    let summary = engine.compute(&mixed_nesting(), &overrides).unwrap();
    assert_eq!(summary.allocation_model, AllocationModel::LegacyUtilization);

    let nesting = mixed_nesting();
    for (sheet, breakdown) in nesting.sheets.iter().zip(&summary.variant_a.sheets) {
        let allocated: f64 = sheet
            .parts
            .iter()
            .map(|p| summary.per_part[&p.instance_id].material_pln)
            .sum();
        assert!((allocated - breakdown.material_pln).abs() <= 0.01);
    }
}

#[cfg(feature = "serde")]
#[test]
fn cost_summary_serialises() {
    let book = fast_steel_book();
    let machine = profile();
    let engine = CostingEngine::new(&book, &machine);
    let summary = engine.compute(&mixed_nesting(), &JobOverrides::default()).unwrap();

    let json = serde_json::to_string(&summary).unwrap();
    assert!(json.contains("variant_a"));
    assert!(json.contains("per_part"));
}
