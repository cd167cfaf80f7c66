use pipette_core::model::{MeasurementKey, Solution};

use super::service::WorksheetSession;

/// One line of the data-entry table with its derived columns.
///
/// Rows the learner has not opened yet are listed with `entries: None` so
/// the table always shows the full worksheet layout.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub key: MeasurementKey,
    pub solution: Solution,
    pub target_volume_ul: u32,
    pub expected_mass_g: f64,
    pub entries: Option<Vec<f64>>,
    pub notes: String,
    pub mean_g: Option<f64>,
    pub std_dev_g: Option<f64>,
    /// Mean minus expected mass. Only meaningful for water-like solutions.
    pub accuracy_error_g: Option<f64>,
}

impl MeasurementRow {
    #[must_use]
    pub fn label(&self) -> String {
        self.key.label()
    }
}

/// Table rows in worksheet order.
#[must_use]
pub fn measurement_table(session: &WorksheetSession) -> Vec<MeasurementRow> {
    session
        .variant()
        .measurement_keys()
        .into_iter()
        .map(|key| {
            let expected = key.instrument.expected_mass_grams();
            let set = session.measurements().get(key);
            let stats = set.map(pipette_core::model::MeasurementSet::statistics);
            MeasurementRow {
                key,
                solution: key.solution,
                target_volume_ul: key.instrument.target_volume_ul(),
                expected_mass_g: expected,
                entries: session.measurements().entries(key).map(<[f64]>::to_vec),
                notes: set.map(|s| s.notes().to_string()).unwrap_or_default(),
                mean_g: stats.map(|s| s.mean),
                std_dev_g: stats.map(|s| s.std_dev),
                accuracy_error_g: stats
                    .filter(|_| key.solution == Solution::RedFoodColoring)
                    .map(|s| s.accuracy_error(expected)),
            }
        })
        .collect()
}
