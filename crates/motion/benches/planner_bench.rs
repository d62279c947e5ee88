//! Benchmarks for the motion planner.
//!
//! Measures lookahead planning and full-contour timing at various
//! segment counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nestcost_core::MachineProfile;
use nestcost_motion::{contour_time, plan_junction_speeds};
use nestcost_toolpath::ContourMotion;

fn lacy_contour(n: usize) -> ContourMotion {
    let lengths_mm: Vec<f64> = (0..n).map(|i| 2.0 + (i % 7) as f64 * 9.0).collect();
    let junction_angles_deg: Vec<f64> = (0..n.saturating_sub(1))
        .map(|i| 30.0 + (i % 6) as f64 * 28.0)
        .collect();
    ContourMotion {
        lengths_mm,
        junction_angles_deg,
    }
}

fn bench_contour_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("contour_time");
    let profile = MachineProfile::default();

    for &n in &[16, 256, 4096] {
        let contour = lacy_contour(n);
        group.bench_with_input(BenchmarkId::new("segments", n), &contour, |b, contour| {
            b.iter(|| contour_time(black_box(contour), black_box(3000.0), &profile))
        });
    }
    group.finish();
}

fn bench_plan_speeds(c: &mut Criterion) {
    let contour = lacy_contour(1024);
    let mut limits = vec![0.0];
    limits.extend(std::iter::repeat(50.0).take(1023));
    limits.push(0.0);

    c.bench_function("plan_junction_speeds_1024", |b| {
        b.iter(|| {
            plan_junction_speeds(
                black_box(&contour.lengths_mm),
                black_box(&limits),
                3000.0,
                2000.0,
            )
        })
    });
}

criterion_group!(benches, bench_contour_time, bench_plan_speeds);
criterion_main!(benches);
