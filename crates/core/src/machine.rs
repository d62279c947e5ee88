//! Machine dynamics profile.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Machine dynamics parameters used by the motion planner.
///
/// Read-mostly configuration; changes between runs take effect at the
/// next run boundary.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MachineProfile {
    /// Profile identifier echoed into cost summaries.
    pub id: String,

    /// Maximum acceleration [mm/s²].
    pub max_accel_mm_s2: f64,

    /// Maximum rapid traverse speed [mm/s].
    pub max_rapid_mm_s: f64,

    /// Speed the machine sustains through a 90° corner [mm/s].
    pub square_corner_velocity_mm_s: f64,

    /// Maximum allowed path deviation for the junction-deviation
    /// corner model [mm].
    pub junction_deviation_mm: Option<f64>,

    /// Selects the junction-deviation model instead of the
    /// square-corner-velocity model.
    pub use_junction_deviation: bool,
}

impl Default for MachineProfile {
    fn default() -> Self {
        Self {
            id: String::new(),
            max_accel_mm_s2: 2000.0,
            max_rapid_mm_s: 500.0,
            square_corner_velocity_mm_s: 50.0,
            junction_deviation_mm: None,
            use_junction_deviation: false,
        }
    }
}

impl MachineProfile {
    /// Creates a profile with the given id and default dynamics.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the maximum acceleration [mm/s²].
    pub fn with_max_accel(mut self, accel: f64) -> Self {
        self.max_accel_mm_s2 = accel;
        self
    }

    /// Sets the maximum rapid speed [mm/s].
    pub fn with_max_rapid(mut self, rapid: f64) -> Self {
        self.max_rapid_mm_s = rapid;
        self
    }

    /// Sets the square-corner velocity [mm/s].
    pub fn with_square_corner_velocity(mut self, v: f64) -> Self {
        self.square_corner_velocity_mm_s = v;
        self
    }

    /// Enables the junction-deviation corner model with the given
    /// deviation [mm].
    pub fn with_junction_deviation(mut self, deviation_mm: f64) -> Self {
        self.junction_deviation_mm = Some(deviation_mm);
        self.use_junction_deviation = true;
        self
    }

    /// Returns the active corner model. The two models are exclusive.
    pub fn corner_model(&self) -> CornerModel {
        match (self.use_junction_deviation, self.junction_deviation_mm) {
            (true, Some(deviation_mm)) => CornerModel::JunctionDeviation { deviation_mm },
            _ => CornerModel::SquareCorner {
                v_corner_90_mm_s: self.square_corner_velocity_mm_s,
            },
        }
    }
}

/// Cornering model used to cap speed at segment junctions.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CornerModel {
    /// Scale a single 90°-corner speed by the junction angle.
    SquareCorner {
        /// Speed sustained through a 90° corner [mm/s].
        v_corner_90_mm_s: f64,
    },
    /// Klipper-style junction deviation: speed from the permitted path
    /// deviation and the machine acceleration.
    JunctionDeviation {
        /// Maximum allowed deviation from the programmed path [mm].
        deviation_mm: f64,
    },
}
