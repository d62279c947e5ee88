//! Nesting result model.
//!
//! The contract between the external nester and the costing engine.
//! `sheet_*` fields and `occupied_area_mm2` are authoritative: the
//! engine re-validates their invariants but never recomputes areas from
//! geometry.

use nestcost_core::{Error, Result};
use nestcost_geometry::Transform;
use nestcost_toolpath::{CacheKey, MotionInputs, ToolpathStats};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance for the per-sheet occupied-area sum invariant [mm²].
pub const AREA_SUM_TOLERANCE_MM2: f64 = 1.0;

/// Origin of a nesting job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SourceType {
    /// Confirmed order.
    #[default]
    Order,
    /// Quotation in progress.
    Quotation,
}

/// Sheet sizing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SheetMode {
    /// Standard sheet format, billed at nominal size.
    #[default]
    FixedSheet,
    /// Coil stock trimmed in the long axis to the nested parts plus a
    /// trim margin.
    CutToLength,
}

/// A single part placement on a sheet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartInstance {
    /// Catalogue part this instance was nested from.
    pub part_id: String,

    /// Unique placement id within the nesting result.
    pub instance_id: String,

    /// Drawing the part's toolpath derives from.
    pub drawing_id: String,

    /// Copies represented by this placement (usually 1).
    pub qty_in_sheet: u32,

    /// Placement on the sheet.
    pub transform: Transform,

    /// Footprint reserved on the sheet: outer contour area, holes not
    /// subtracted [mm²].
    pub occupied_area_mm2: f64,

    /// Outer area minus holes [mm²].
    pub net_area_mm2: f64,

    /// Snapshot of the drawing's toolpath stats, when the nester
    /// carried them through.
    pub toolpath_stats: Option<ToolpathStats>,

    /// Per-contour motion data, when available.
    pub motion: Option<MotionInputs>,

    /// Stats-cache key for resolution when the snapshot is absent.
    pub cache_key: Option<CacheKey>,
}

impl PartInstance {
    /// Creates a placement with quantity 1 and no cached stats.
    pub fn new(
        part_id: impl Into<String>,
        instance_id: impl Into<String>,
        drawing_id: impl Into<String>,
    ) -> Self {
        Self {
            part_id: part_id.into(),
            instance_id: instance_id.into(),
            drawing_id: drawing_id.into(),
            qty_in_sheet: 1,
            transform: Transform::identity(),
            occupied_area_mm2: 0.0,
            net_area_mm2: 0.0,
            toolpath_stats: None,
            motion: None,
            cache_key: None,
        }
    }

    /// Sets the quantity represented by this placement.
    pub fn with_qty(mut self, qty: u32) -> Self {
        self.qty_in_sheet = qty;
        self
    }

    /// Sets the placement transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the occupied footprint [mm²].
    pub fn with_occupied_area(mut self, area_mm2: f64) -> Self {
        self.occupied_area_mm2 = area_mm2;
        self
    }

    /// Sets the net area [mm²].
    pub fn with_net_area(mut self, area_mm2: f64) -> Self {
        self.net_area_mm2 = area_mm2;
        self
    }

    /// Attaches a toolpath-stats snapshot.
    pub fn with_stats(mut self, stats: ToolpathStats) -> Self {
        self.toolpath_stats = Some(stats);
        self
    }

    /// Attaches motion inputs.
    pub fn with_motion(mut self, motion: MotionInputs) -> Self {
        self.motion = Some(motion);
        self
    }

    /// Attaches a stats-cache key.
    pub fn with_cache_key(mut self, key: CacheKey) -> Self {
        self.cache_key = Some(key);
        self
    }

    /// Occupied area times quantity [mm²].
    pub fn total_occupied_mm2(&self) -> f64 {
        self.occupied_area_mm2 * self.qty_in_sheet as f64
    }
}

/// One nested sheet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sheet {
    /// Sheet identifier.
    pub sheet_id: String,

    /// Sizing mode.
    pub sheet_mode: SheetMode,

    /// Material of the sheet.
    pub material_id: String,

    /// Sheet thickness [mm].
    pub thickness_mm: f64,

    /// Sheet width [mm].
    pub sheet_width_mm: f64,

    /// Nominal sheet length [mm].
    pub sheet_length_mm_nominal: f64,

    /// Length actually covered by nested parts (max Y) [mm].
    pub used_length_y_mm: f64,

    /// Safety margin added when trimming cut-to-length stock [mm].
    pub trim_margin_y_mm: f64,

    /// Physical sheet area in use [mm²].
    pub sheet_area_used_mm2: f64,

    /// Sum of part footprints [mm²].
    pub occupied_area_mm2: f64,

    /// occupied / sheet_area_used, in [0, 1].
    pub utilization: f64,

    /// Placements on this sheet.
    pub parts: Vec<PartInstance>,
}

impl Sheet {
    /// Creates an empty fixed sheet of the given format.
    pub fn new(
        sheet_id: impl Into<String>,
        material_id: impl Into<String>,
        thickness_mm: f64,
        width_mm: f64,
        length_mm_nominal: f64,
    ) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            sheet_mode: SheetMode::FixedSheet,
            material_id: material_id.into(),
            thickness_mm,
            sheet_width_mm: width_mm,
            sheet_length_mm_nominal: length_mm_nominal,
            used_length_y_mm: 0.0,
            trim_margin_y_mm: 10.0,
            sheet_area_used_mm2: width_mm * length_mm_nominal,
            occupied_area_mm2: 0.0,
            utilization: 0.0,
            parts: Vec::new(),
        }
    }

    /// Switches the sheet to cut-to-length mode with the given used
    /// length.
    pub fn with_cut_to_length(mut self, used_length_y_mm: f64) -> Self {
        self.sheet_mode = SheetMode::CutToLength;
        self.used_length_y_mm = used_length_y_mm;
        self.recalculate_metrics();
        self
    }

    /// Adds a placement and refreshes the derived metrics.
    pub fn with_part(mut self, part: PartInstance) -> Self {
        self.parts.push(part);
        self.recalculate_metrics();
        self
    }

    /// Recomputes `sheet_area_used_mm2`, `occupied_area_mm2` and
    /// `utilization` from the placements.
    pub fn recalculate_metrics(&mut self) {
        self.sheet_area_used_mm2 = match self.sheet_mode {
            SheetMode::FixedSheet => self.sheet_width_mm * self.sheet_length_mm_nominal,
            SheetMode::CutToLength => {
                self.sheet_width_mm * (self.used_length_y_mm + self.trim_margin_y_mm)
            }
        };

        self.occupied_area_mm2 = self.parts.iter().map(PartInstance::total_occupied_mm2).sum();

        self.utilization = if self.sheet_area_used_mm2 > 0.0 {
            self.occupied_area_mm2 / self.sheet_area_used_mm2
        } else {
            0.0
        };
    }

    /// Validates the sheet invariants.
    pub fn validate(&self) -> Result<()> {
        if self.sheet_width_mm <= 0.0 || self.sheet_length_mm_nominal <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "sheet '{}' has non-positive dimensions",
                self.sheet_id
            )));
        }
        if self.thickness_mm <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "sheet '{}' has non-positive thickness",
                self.sheet_id
            )));
        }
        if self.material_id.is_empty() {
            return Err(Error::InvalidInput(format!(
                "sheet '{}' has no material",
                self.sheet_id
            )));
        }

        for part in &self.parts {
            if part.occupied_area_mm2 < 0.0 || part.net_area_mm2 < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "part instance '{}' has a negative area",
                    part.instance_id
                )));
            }
            if part.qty_in_sheet == 0 {
                return Err(Error::InvalidInput(format!(
                    "part instance '{}' has zero quantity",
                    part.instance_id
                )));
            }
        }

        let occupied_sum: f64 = self.parts.iter().map(PartInstance::total_occupied_mm2).sum();
        if (occupied_sum - self.occupied_area_mm2).abs() > AREA_SUM_TOLERANCE_MM2 {
            return Err(Error::InvariantViolation {
                sheet_id: self.sheet_id.clone(),
                detail: format!(
                    "part occupied areas sum to {:.1} mm² but the sheet declares {:.1} mm²",
                    occupied_sum, self.occupied_area_mm2
                ),
            });
        }

        if !self.parts.is_empty() && self.sheet_area_used_mm2 + AREA_SUM_TOLERANCE_MM2
            < self.occupied_area_mm2
        {
            return Err(Error::InvariantViolation {
                sheet_id: self.sheet_id.clone(),
                detail: "occupied area exceeds the sheet area in use".to_string(),
            });
        }

        if !(0.0..=1.0 + 1e-9).contains(&self.utilization) {
            return Err(Error::InvariantViolation {
                sheet_id: self.sheet_id.clone(),
                detail: format!("utilization {} outside [0, 1]", self.utilization),
            });
        }

        Ok(())
    }
}

/// Output of the external nester for one costing run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NestingResult {
    /// Whether the run prices an order or a quotation.
    pub source_type: SourceType,

    /// Order or quotation id.
    pub source_id: String,

    /// Machine profile the parts were nested for.
    pub machine_profile_id: String,

    /// Nested sheets.
    pub sheets: Vec<Sheet>,
}

impl NestingResult {
    /// Creates an empty result.
    pub fn new(source_type: SourceType, source_id: impl Into<String>) -> Self {
        Self {
            source_type,
            source_id: source_id.into(),
            machine_profile_id: String::new(),
            sheets: Vec::new(),
        }
    }

    /// Sets the machine profile id.
    pub fn with_machine_profile(mut self, id: impl Into<String>) -> Self {
        self.machine_profile_id = id.into();
        self
    }

    /// Adds a sheet.
    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Validates every sheet's invariants.
    pub fn validate(&self) -> Result<()> {
        for sheet in &self.sheets {
            sheet.validate()?;
        }
        Ok(())
    }
}
