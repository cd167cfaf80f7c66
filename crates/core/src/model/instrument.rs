use serde::{Deserialize, Serialize};
use std::fmt;

//
// ─── INSTRUMENT ────────────────────────────────────────────────────────────────
//

/// The three micropipette sizes used on the worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Instrument {
    P20,
    P200,
    P1000,
}

/// Approximate density of the aqueous solutions, in grams per microlitre.
pub const WATER_GRAMS_PER_UL: f64 = 0.001;

impl Instrument {
    pub const ALL: [Instrument; 3] = [Instrument::P20, Instrument::P200, Instrument::P1000];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Instrument::P20 => "P20",
            Instrument::P200 => "P200",
            Instrument::P1000 => "P1000",
        }
    }

    /// Volume the learner is asked to dispense with this pipette.
    #[must_use]
    pub fn target_volume_ul(self) -> u32 {
        match self {
            Instrument::P20 => 20,
            Instrument::P200 => 200,
            Instrument::P1000 => 1000,
        }
    }

    /// Inclusive working range of the pipette, in microlitres.
    #[must_use]
    pub fn working_range_ul(self) -> (u32, u32) {
        match self {
            Instrument::P20 => (2, 20),
            Instrument::P200 => (20, 200),
            Instrument::P1000 => (100, 1000),
        }
    }

    /// Mass a perfect dispense of the target volume would weigh.
    #[must_use]
    pub fn expected_mass_grams(self) -> f64 {
        f64::from(self.target_volume_ul()) * WATER_GRAMS_PER_UL
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── SOLUTION ──────────────────────────────────────────────────────────────────
//

/// Liquid being pipetted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Solution {
    RedFoodColoring,
    ViscousLiquid,
}

impl Solution {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Solution::RedFoodColoring => "Red Food Coloring",
            Solution::ViscousLiquid => "Viscous Liquid",
        }
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── MEASUREMENT KEY ───────────────────────────────────────────────────────────
//

/// One row of the data-entry table: an instrument used with a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeasurementKey {
    pub instrument: Instrument,
    pub solution: Solution,
}

impl MeasurementKey {
    #[must_use]
    pub fn new(instrument: Instrument, solution: Solution) -> Self {
        Self {
            instrument,
            solution,
        }
    }

    /// Human label shown next to the row, e.g. `P200 / Viscous Liquid`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} / {}", self.instrument, self.solution)
    }
}
