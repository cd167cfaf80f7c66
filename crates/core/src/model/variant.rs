use serde::{Deserialize, Serialize};

use crate::model::instrument::{Instrument, MeasurementKey, Solution};
use crate::model::quiz::{ChoiceQuestion, TextQuestion};

/// The two worksheet editions.
///
/// `Practice` is the self-check handout (two solutions, no submission);
/// `ProgressTracking` is the graded edition whose results are appended to
/// the class spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorksheetVariant {
    Practice,
    ProgressTracking,
}

impl WorksheetVariant {
    /// Number of balance readings per table row.
    #[must_use]
    pub fn trial_count(self) -> usize {
        match self {
            WorksheetVariant::Practice => 3,
            WorksheetVariant::ProgressTracking => 5,
        }
    }

    #[must_use]
    pub fn solutions(self) -> &'static [Solution] {
        match self {
            WorksheetVariant::Practice => &[Solution::RedFoodColoring, Solution::ViscousLiquid],
            WorksheetVariant::ProgressTracking => &[Solution::RedFoodColoring],
        }
    }

    /// Every data-entry row of this edition, in display order.
    #[must_use]
    pub fn measurement_keys(self) -> Vec<MeasurementKey> {
        self.solutions()
            .iter()
            .flat_map(|solution| {
                Instrument::ALL
                    .into_iter()
                    .map(move |instrument| MeasurementKey::new(instrument, *solution))
            })
            .collect()
    }

    #[must_use]
    pub fn choice_questions(self) -> &'static [ChoiceQuestion] {
        match self {
            WorksheetVariant::Practice => &[
                ChoiceQuestion::WrongPipette,
                ChoiceQuestion::ErrorCauses,
                ChoiceQuestion::Bubble,
            ],
            WorksheetVariant::ProgressTracking => &[
                ChoiceQuestion::SetVolume,
                ChoiceQuestion::DrawLiquid,
                ChoiceQuestion::Dispense,
                ChoiceQuestion::Viscous,
            ],
        }
    }

    #[must_use]
    pub fn text_questions(self) -> &'static [TextQuestion] {
        match self {
            WorksheetVariant::Practice => {
                &[TextQuestion::StopDifference, TextQuestion::ViscousTrick]
            }
            WorksheetVariant::ProgressTracking => &[],
        }
    }

    #[must_use]
    pub fn reflection_prompts(self) -> &'static [&'static str] {
        match self {
            WorksheetVariant::Practice => &[
                "Which liquid was harder to pipette accurately? Why?",
                "What would happen if you messed up pipetting in a real biotech lab?",
                "What would you do differently for a sensitive experiment?",
                "Look at your standard deviations. What does the size of the standard deviation tell you about your experimental error or pipetting technique?",
            ],
            WorksheetVariant::ProgressTracking => &[
                "Which pipette was hardest to use consistently? Why?",
                "What does your standard deviation tell you about your technique?",
            ],
        }
    }

    /// Whether a finished session is appended to the progress sheet.
    #[must_use]
    pub fn is_submittable(self) -> bool {
        matches!(self, WorksheetVariant::ProgressTracking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn practice_has_a_row_per_instrument_and_solution() {
        let keys = WorksheetVariant::Practice.measurement_keys();
        assert_eq!(keys.len(), 6);
        assert_eq!(keys[0].label(), "P20 / Red Food Coloring");
        assert_eq!(keys[3].label(), "P20 / Viscous Liquid");
    }

    #[test]
    fn progress_tracking_covers_each_instrument_once() {
        let keys = WorksheetVariant::ProgressTracking.measurement_keys();
        let instruments: Vec<_> = keys.iter().map(|k| k.instrument).collect();
        assert_eq!(instruments, Instrument::ALL.to_vec());
        assert!(WorksheetVariant::ProgressTracking.is_submittable());
        assert!(!WorksheetVariant::Practice.is_submittable());
    }

    #[test]
    fn progress_tracking_fills_two_reflection_columns() {
        assert_eq!(
            WorksheetVariant::ProgressTracking.reflection_prompts().len(),
            2
        );
    }
}
