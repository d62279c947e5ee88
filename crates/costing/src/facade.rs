//! Costing entry point.
//!
//! [`CostingEngine`] wires the rate book, machine profile and the
//! optional stats cache / drawing source together and produces a
//! [`CostSummary`] for a nesting result. A run is a pure function of
//! its inputs: no partial output, warnings collected alongside.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use instant::Instant;
use rayon::prelude::*;

use nestcost_core::{Error, MachineProfile, Result, Warning};
use nestcost_toolpath::{
    extract, resolve_stats, DrawingSource, ExtractorConfig, StatsCache,
};

use crate::allocation::distribute_proportionally;
use crate::engine::{compute_sheet, ResolvedPart};
use crate::model::{NestingResult, PartInstance};
use crate::overrides::JobOverrides;
use crate::rates::RateBook;
use crate::summary::{CostSummary, JobCosts, PartCost, SheetCostA, SheetCostB, VariantSummary};

/// The costing facade: one entry point per run.
pub struct CostingEngine<'a> {
    rate_book: &'a RateBook,
    profile: &'a MachineProfile,
    cache: Option<&'a dyn StatsCache>,
    source: Option<&'a dyn DrawingSource>,
    extractor: ExtractorConfig,
}

impl<'a> CostingEngine<'a> {
    /// Creates an engine over a rate book and machine profile.
    pub fn new(rate_book: &'a RateBook, profile: &'a MachineProfile) -> Self {
        Self {
            rate_book,
            profile,
            cache: None,
            source: None,
            extractor: ExtractorConfig::default(),
        }
    }

    /// Attaches a stats cache for parts without stat snapshots.
    pub fn with_cache(mut self, cache: &'a dyn StatsCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attaches a drawing source for cache misses.
    pub fn with_drawing_source(mut self, source: &'a dyn DrawingSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the extraction config used on cache misses.
    pub fn with_extractor_config(mut self, config: ExtractorConfig) -> Self {
        self.extractor = config;
        self
    }

    /// Computes a cost summary for a nesting result.
    pub fn compute(
        &self,
        nesting: &NestingResult,
        overrides: &JobOverrides,
    ) -> Result<CostSummary> {
        self.compute_inner(nesting, overrides, None)
    }

    /// Computes a cost summary with cooperative cancellation. The flag
    /// is checked between sheets; a cancelled run produces no partial
    /// output.
    pub fn compute_cancellable(
        &self,
        nesting: &NestingResult,
        overrides: &JobOverrides,
        cancel: &AtomicBool,
    ) -> Result<CostSummary> {
        self.compute_inner(nesting, overrides, Some(cancel))
    }

    /// Computes summaries for independent runs in parallel.
    pub fn compute_batch(
        &self,
        runs: &[(&NestingResult, &JobOverrides)],
    ) -> Vec<Result<CostSummary>> {
        runs.par_iter()
            .map(|(nesting, overrides)| self.compute(nesting, overrides))
            .collect()
    }

    fn compute_inner(
        &self,
        nesting: &NestingResult,
        overrides: &JobOverrides,
        cancel: Option<&AtomicBool>,
    ) -> Result<CostSummary> {
        let started = Instant::now();

        nesting.validate()?;

        let mut warnings = Vec::new();
        if overrides.buffer_factor < 1.0 {
            tracing::warn!(
                buffer_factor = overrides.buffer_factor,
                "buffer factor below 1.0"
            );
            warnings.push(Warning::BufferBelowOne {
                buffer_factor: overrides.buffer_factor,
            });
        }

        let mut sheets_a: Vec<SheetCostA> = Vec::with_capacity(nesting.sheets.len());
        let mut sheets_b: Vec<SheetCostB> = Vec::with_capacity(nesting.sheets.len());
        let mut per_part: BTreeMap<String, PartCost> = BTreeMap::new();

        for sheet in &nesting.sheets {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(Error::Cancelled);
            }

            let (entry, substitution) =
                self.rate_book.resolve(&sheet.material_id, sheet.thickness_mm)?;
            warnings.extend(substitution);

            let resolved: Vec<ResolvedPart> = sheet
                .parts
                .iter()
                .map(|part| self.resolve_part(part, &mut warnings))
                .collect::<Result<_>>()?;

            let outcome = compute_sheet(
                sheet,
                &resolved,
                entry,
                self.rate_book,
                overrides,
                self.profile,
            );

            sheets_a.push(outcome.a);
            sheets_b.push(outcome.b);
            for part in outcome.parts {
                if per_part.contains_key(&part.instance_id) {
                    return Err(Error::InvalidInput(format!(
                        "duplicate part instance id '{}'",
                        part.instance_id
                    )));
                }
                per_part.insert(part.instance_id.clone(), part);
            }
        }

        let sheets_total_a: f64 = sheets_a.iter().map(|s| s.total_pln).sum();
        let sheets_total_b: f64 = sheets_b.iter().map(|s| s.total_pln).sum();

        let passthrough = overrides.job_costs_total();
        let margin_a = (sheets_total_a + passthrough) * overrides.margin_percent / 100.0;
        let margin_b = (sheets_total_b + passthrough) * overrides.margin_percent / 100.0;

        attribute_job_costs(&mut per_part, passthrough + margin_a, passthrough + margin_b);

        let summary = CostSummary {
            allocation_model: overrides.allocation_model,
            buffer_factor: overrides.buffer_factor,
            machine_profile_id: nesting.machine_profile_id.clone(),
            variant_a: VariantSummary {
                total_pln: sheets_total_a + passthrough + margin_a,
                sheets: sheets_a,
                job_costs: JobCosts {
                    tech_cost_pln: overrides.tech_cost_pln,
                    packaging_cost_pln: overrides.packaging_cost_pln,
                    transport_cost_pln: overrides.transport_cost_pln,
                    margin_pln: margin_a,
                },
            },
            variant_b: VariantSummary {
                total_pln: sheets_total_b + passthrough + margin_b,
                sheets: sheets_b,
                job_costs: JobCosts {
                    tech_cost_pln: overrides.tech_cost_pln,
                    packaging_cost_pln: overrides.packaging_cost_pln,
                    transport_cost_pln: overrides.transport_cost_pln,
                    margin_pln: margin_b,
                },
            },
            per_part,
            warnings,
            computation_time_ms: started.elapsed().as_millis() as u64,
        };

        tracing::info!(
            source_id = %nesting.source_id,
            total_a = summary.variant_a.total_pln,
            total_b = summary.variant_b.total_pln,
            "costing complete"
        );

        Ok(summary)
    }

    fn resolve_part(
        &self,
        part: &PartInstance,
        warnings: &mut Vec<Warning>,
    ) -> Result<ResolvedPart> {
        if let Some(stats) = &part.toolpath_stats {
            return Ok(ResolvedPart {
                stats: stats.clone(),
                motion: part.motion.clone(),
            });
        }

        let missing = || Error::StatsMissing {
            drawing_id: part.drawing_id.clone(),
        };

        match (self.cache, self.source) {
            (Some(cache), Some(source)) => {
                let (cached, extraction_warnings) = resolve_stats(
                    &part.drawing_id,
                    part.cache_key,
                    cache,
                    source,
                    &self.extractor,
                )?;
                warnings.extend(extraction_warnings);
                Ok(ResolvedPart {
                    stats: cached.stats,
                    motion: cached.motion,
                })
            }
            (Some(cache), None) => {
                let cached = part
                    .cache_key
                    .and_then(|key| cache.get(&key))
                    .ok_or_else(missing)?;
                Ok(ResolvedPart {
                    stats: cached.stats,
                    motion: cached.motion,
                })
            }
            (None, Some(source)) => {
                let drawing = source.fetch(&part.drawing_id)?;
                let extraction = extract(&drawing, &self.extractor)?;
                warnings.extend(extraction.warnings);
                Ok(ResolvedPart {
                    stats: extraction.stats,
                    motion: Some(extraction.motion),
                })
            }
            (None, None) => Err(missing()),
        }
    }
}

/// Adds each instance's share of job-level charges, distributed
/// proportionally to (material + cut).
fn attribute_job_costs(per_part: &mut BTreeMap<String, PartCost>, total_a: f64, total_b: f64) {
    if per_part.is_empty() {
        return;
    }

    let ids: Vec<&str> = per_part.keys().map(String::as_str).collect();
    let weights_a: Vec<f64> = per_part
        .values()
        .map(|p| p.material_pln + p.cut_a_pln)
        .collect();
    let weights_b: Vec<f64> = per_part
        .values()
        .map(|p| p.material_pln + p.cut_b_pln)
        .collect();

    let shares_a = distribute_proportionally(total_a, &weights_a, &ids);
    let shares_b = distribute_proportionally(total_b, &weights_b, &ids);

    for (i, part) in per_part.values_mut().enumerate() {
        part.job_a_pln = shares_a[i];
        part.job_b_pln = shares_b[i];
    }
}
