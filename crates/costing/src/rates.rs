//! Rate book and rate resolution.
//!
//! Rates are keyed by (material, thickness). Lookup prefers an exact
//! thickness match, falls back to the nearest thickness within a
//! relative tolerance (default ±20 %) with a warning, and otherwise
//! fails with `RateMissing`.

use std::collections::HashMap;

use nestcost_core::{Error, Result, Warning};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sheet material pricing basis. Exactly one applies per rate entry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MaterialPrice {
    /// Price per square metre of sheet.
    PerSquareMetre {
        /// PLN per m².
        pln_per_m2: f64,
    },
    /// Price per kilogram; mass follows from area, thickness and
    /// density.
    PerKilogram {
        /// PLN per kg.
        pln_per_kg: f64,
    },
}

/// Foil-removal pricing basis for variant A.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FoilCost {
    /// Priced by removal time.
    PerMinute {
        /// PLN per minute of removal.
        pln_per_min: f64,
    },
    /// Priced by billed sheet area.
    PerSquareMetre {
        /// PLN per m².
        pln_per_m2: f64,
    },
    /// Priced by cut length.
    PerMetre {
        /// PLN per metre of cut.
        pln_per_m: f64,
    },
}

/// Foil-removal rule: applies to stainless-like materials up to a
/// thickness cap.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FoilRule {
    /// Removal speed [m/min].
    pub speed_m_min: f64,
    /// Variant-A pricing basis.
    pub cost: FoilCost,
    /// Auto-enable only up to this thickness [mm].
    pub max_thickness_mm: f64,
}

impl Default for FoilRule {
    fn default() -> Self {
        Self {
            speed_m_min: 15.0,
            cost: FoilCost::PerMinute { pln_per_min: 2.0 },
            max_thickness_mm: 5.0,
        }
    }
}

/// Rates for one (material, thickness) pair.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RateEntry {
    /// Material grade, e.g. "S235" or "1.4301".
    pub material_id: String,

    /// Thickness this entry applies to [mm].
    pub thickness_mm: f64,

    /// Material density [kg/m³].
    pub density_kg_m3: f64,

    /// Sheet pricing basis.
    pub material_price: MaterialPrice,

    /// Cutting feedrate [m/min].
    pub cut_feedrate_m_min: f64,

    /// Variant-A cutting tariff [PLN/m].
    pub cut_price_per_meter_pln: f64,

    /// Variant-B machine rate [PLN/h].
    pub machine_rate_pln_per_hour: f64,

    /// Dwell time per pierce [s].
    pub pierce_time_s: f64,

    /// Variant-A cost per pierce [PLN], when priced.
    pub pierce_cost_pln: Option<f64>,

    /// Cost per punch for punching machines [PLN], when priced.
    pub punch_cost_per_punch_pln: Option<f64>,

    /// Marks the material as stainless-like for foil-removal
    /// applicability.
    pub stainless_like: bool,
}

impl RateEntry {
    /// Creates an entry with the given pricing basis and neutral
    /// defaults for the remaining rates.
    pub fn new(
        material_id: impl Into<String>,
        thickness_mm: f64,
        density_kg_m3: f64,
        material_price: MaterialPrice,
    ) -> Self {
        Self {
            material_id: material_id.into(),
            thickness_mm,
            density_kg_m3,
            material_price,
            cut_feedrate_m_min: 5.0,
            cut_price_per_meter_pln: 0.0,
            machine_rate_pln_per_hour: 350.0,
            pierce_time_s: 0.5,
            pierce_cost_pln: None,
            punch_cost_per_punch_pln: None,
            stainless_like: false,
        }
    }

    /// Sets the cutting feedrate [m/min].
    pub fn with_feedrate(mut self, m_min: f64) -> Self {
        self.cut_feedrate_m_min = m_min;
        self
    }

    /// Sets the variant-A cutting tariff [PLN/m].
    pub fn with_cut_price(mut self, pln_per_m: f64) -> Self {
        self.cut_price_per_meter_pln = pln_per_m;
        self
    }

    /// Sets the variant-B machine rate [PLN/h].
    pub fn with_machine_rate(mut self, pln_per_h: f64) -> Self {
        self.machine_rate_pln_per_hour = pln_per_h;
        self
    }

    /// Sets the pierce dwell time and cost.
    pub fn with_pierce(mut self, time_s: f64, cost_pln: f64) -> Self {
        self.pierce_time_s = time_s;
        self.pierce_cost_pln = Some(cost_pln);
        self
    }

    /// Sets the punch cost [PLN/punch].
    pub fn with_punch_cost(mut self, pln_per_punch: f64) -> Self {
        self.punch_cost_per_punch_pln = Some(pln_per_punch);
        self
    }

    /// Marks the material stainless-like.
    pub fn stainless(mut self) -> Self {
        self.stainless_like = true;
        self
    }
}

/// Rate book: every (material, thickness) rate plus the foil rule.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RateBook {
    entries: HashMap<String, Vec<RateEntry>>,

    /// Foil-removal rule, when the shop removes protective foil.
    pub foil: Option<FoilRule>,

    /// Relative thickness tolerance for nearest-match lookup.
    pub thickness_tolerance: f64,
}

impl Default for RateBook {
    fn default() -> Self {
        Self::new()
    }
}

impl RateBook {
    /// Creates an empty book with the default ±20 % lookup tolerance.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            foil: None,
            thickness_tolerance: 0.2,
        }
    }

    /// Adds an entry.
    pub fn insert(&mut self, entry: RateEntry) {
        self.entries
            .entry(entry.material_id.clone())
            .or_default()
            .push(entry);
    }

    /// Adds an entry, builder style.
    pub fn with_entry(mut self, entry: RateEntry) -> Self {
        self.insert(entry);
        self
    }

    /// Sets the foil rule.
    pub fn with_foil(mut self, foil: FoilRule) -> Self {
        self.foil = Some(foil);
        self
    }

    /// Sets the relative thickness tolerance for nearest-match lookup.
    pub fn with_thickness_tolerance(mut self, tolerance: f64) -> Self {
        self.thickness_tolerance = tolerance;
        self
    }

    /// Number of entries across all materials.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether the book has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves the rate for a material and thickness.
    ///
    /// Exact thickness wins; otherwise the nearest thickness within the
    /// relative tolerance substitutes, with a warning. No match within
    /// tolerance fails with [`Error::RateMissing`].
    pub fn resolve(
        &self,
        material_id: &str,
        thickness_mm: f64,
    ) -> Result<(&RateEntry, Option<Warning>)> {
        let missing = || Error::RateMissing {
            material_id: material_id.to_string(),
            thickness_mm,
        };

        let entries = self.entries.get(material_id).ok_or_else(missing)?;

        if let Some(exact) = entries
            .iter()
            .find(|e| (e.thickness_mm - thickness_mm).abs() < 1e-6)
        {
            return Ok((exact, None));
        }

        let nearest = entries
            .iter()
            .filter(|e| {
                (e.thickness_mm - thickness_mm).abs() <= self.thickness_tolerance * thickness_mm
            })
            .min_by(|a, b| {
                let da = (a.thickness_mm - thickness_mm).abs();
                let db = (b.thickness_mm - thickness_mm).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or_else(missing)?;

        tracing::warn!(
            material_id,
            requested_mm = thickness_mm,
            matched_mm = nearest.thickness_mm,
            "no exact rate; substituting nearest thickness"
        );

        Ok((
            nearest,
            Some(Warning::RateSubstituted {
                material_id: material_id.to_string(),
                requested_mm: thickness_mm,
                matched_mm: nearest.thickness_mm,
            }),
        ))
    }

    /// Whether foil removal auto-enables for an entry: the book has a
    /// foil rule, the material is stainless-like and thin enough.
    pub fn foil_auto_enabled(&self, entry: &RateEntry) -> bool {
        self.foil
            .as_ref()
            .map(|rule| entry.stainless_like && entry.thickness_mm <= rule.max_thickness_mm)
            .unwrap_or(false)
    }

    /// Default book covering the common structural, stainless and
    /// aluminium grades.
    pub fn with_defaults() -> Self {
        let mut book = Self::new().with_foil(FoilRule::default());

        // Structural steels, priced per kg
        for (material, prices) in [
            (
                "S235",
                &[
                    (1.0, 4.40),
                    (2.0, 4.50),
                    (3.0, 4.70),
                    (4.0, 4.80),
                    (5.0, 4.90),
                    (6.0, 5.00),
                    (8.0, 5.10),
                    (10.0, 5.20),
                ][..],
            ),
            (
                "S355",
                &[
                    (2.0, 5.00),
                    (3.0, 5.10),
                    (4.0, 5.20),
                    (5.0, 5.30),
                    (6.0, 5.40),
                    (8.0, 5.50),
                    (10.0, 5.60),
                ][..],
            ),
            (
                "DC01",
                &[(1.0, 5.20), (1.5, 5.30), (2.0, 5.40), (3.0, 5.60)][..],
            ),
        ] {
            for &(thickness, pln_per_kg) in prices {
                book.insert(
                    RateEntry::new(
                        material,
                        thickness,
                        7850.0,
                        MaterialPrice::PerKilogram { pln_per_kg },
                    )
                    .with_feedrate((8.0 - thickness * 0.4).max(0.5))
                    .with_cut_price(0.8 + thickness * 0.32)
                    .with_machine_rate(350.0)
                    .with_pierce(0.3 + thickness * 0.2, 0.10 + thickness * 0.1),
                );
            }
        }

        // Stainless grades, priced per kg, foil auto-enables
        for (material, density, prices) in [
            (
                "1.4301",
                7900.0,
                &[
                    (1.0, 17.00),
                    (1.5, 17.50),
                    (2.0, 18.00),
                    (3.0, 19.00),
                    (4.0, 20.00),
                    (5.0, 21.00),
                    (6.0, 22.00),
                ][..],
            ),
            (
                "1.4404",
                7950.0,
                &[
                    (1.0, 22.00),
                    (2.0, 23.00),
                    (3.0, 24.00),
                    (4.0, 25.00),
                    (5.0, 26.00),
                ][..],
            ),
        ] {
            for &(thickness, pln_per_kg) in prices {
                book.insert(
                    RateEntry::new(
                        material,
                        thickness,
                        density,
                        MaterialPrice::PerKilogram { pln_per_kg },
                    )
                    .with_feedrate((6.0 - thickness * 0.5).max(0.3))
                    .with_cut_price(1.5 + thickness * 0.75)
                    .with_machine_rate(350.0)
                    .with_pierce(0.5 + thickness * 0.1, 0.15 + thickness * 0.18)
                    .stainless(),
                );
            }
        }

        // Aluminium, priced per kg
        for &(thickness, pln_per_kg) in &[(1.0, 12.00), (2.0, 12.00), (3.0, 12.50), (4.0, 13.00)] {
            book.insert(
                RateEntry::new(
                    "ALU",
                    thickness,
                    2700.0,
                    MaterialPrice::PerKilogram { pln_per_kg },
                )
                .with_feedrate((7.0 - thickness * 0.5).max(0.5))
                .with_cut_price(1.2 + thickness * 0.45)
                .with_machine_rate(350.0)
                .with_pierce(0.4 + thickness * 0.15, 0.12 + thickness * 0.12),
            );
        }

        book
    }
}
