use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::instrument::MeasurementKey;
use crate::stats::{DerivedStatistics, compute_stats};

/// Lowest mass the balance form accepts, in grams.
pub const MIN_MASS_GRAMS: f64 = 0.0;
/// Highest mass the balance form accepts, in grams.
pub const MAX_MASS_GRAMS: f64 = 2.0;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum MeasurementError {
    /// Input outside `[MIN_MASS_GRAMS, MAX_MASS_GRAMS]`; the entry is left unchanged.
    #[error("mass {value} g is outside the accepted range [0, 2]")]
    OutOfRange { value: f64 },

    #[error("mass must be a finite number")]
    NotFinite,

    #[error("trial {index} does not exist (trial count is {trial_count})")]
    TrialOutOfRange { index: usize, trial_count: usize },

    #[error("trial count must be > 0")]
    InvalidTrialCount,

    #[error("{key} has {actual} entries, expected {expected}")]
    LengthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("{key} appears more than once")]
    DuplicateRow { key: String },
}

/// Validate a single balance reading.
///
/// # Errors
///
/// Returns `MeasurementError::NotFinite` for NaN/infinite input and
/// `MeasurementError::OutOfRange` for anything outside the accepted range.
pub fn validate_mass(value: f64) -> Result<f64, MeasurementError> {
    if !value.is_finite() {
        return Err(MeasurementError::NotFinite);
    }
    if !(MIN_MASS_GRAMS..=MAX_MASS_GRAMS).contains(&value) {
        return Err(MeasurementError::OutOfRange { value });
    }
    Ok(value)
}

//
// ─── MEASUREMENT SET ───────────────────────────────────────────────────────────
//

/// Fixed-length run of mass readings for one table row.
///
/// Statistics are kept in step with the entries: every accepted write
/// recomputes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PersistedSet", into = "PersistedSet")]
pub struct MeasurementSet {
    key: MeasurementKey,
    entries: Vec<f64>,
    notes: String,
    stats: DerivedStatistics,
}

impl MeasurementSet {
    /// Create a zero-filled set with `trial_count` entries.
    ///
    /// # Errors
    ///
    /// Returns `MeasurementError::InvalidTrialCount` when `trial_count` is zero.
    pub fn new(key: MeasurementKey, trial_count: usize) -> Result<Self, MeasurementError> {
        if trial_count == 0 {
            return Err(MeasurementError::InvalidTrialCount);
        }
        Self::from_persisted(key, vec![MIN_MASS_GRAMS; trial_count], String::new())
    }

    /// Rebuild a set from stored entries, re-validating every reading.
    ///
    /// # Errors
    ///
    /// Returns `MeasurementError` if the set is empty or any entry is invalid.
    pub fn from_persisted(
        key: MeasurementKey,
        entries: Vec<f64>,
        notes: String,
    ) -> Result<Self, MeasurementError> {
        for value in &entries {
            validate_mass(*value)?;
        }
        let stats = compute_stats(&entries).map_err(|_| MeasurementError::InvalidTrialCount)?;
        Ok(Self {
            key,
            entries,
            notes,
            stats,
        })
    }

    #[must_use]
    pub fn key(&self) -> MeasurementKey {
        self.key
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.key.label()
    }

    #[must_use]
    pub fn entries(&self) -> &[f64] {
        &self.entries
    }

    #[must_use]
    pub fn trial_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    #[must_use]
    pub fn statistics(&self) -> DerivedStatistics {
        self.stats
    }

    /// Store `value` for `trial_index`.
    ///
    /// # Errors
    ///
    /// Returns `MeasurementError` when the trial does not exist or the value is
    /// refused. A refused write leaves the set untouched.
    pub fn set_entry(&mut self, trial_index: usize, value: f64) -> Result<(), MeasurementError> {
        let trial_count = self.entries.len();
        let value = validate_mass(value)?;
        let slot = self
            .entries
            .get_mut(trial_index)
            .ok_or(MeasurementError::TrialOutOfRange {
                index: trial_index,
                trial_count,
            })?;
        *slot = value;
        self.stats = compute_stats(&self.entries).map_err(|_| MeasurementError::InvalidTrialCount)?;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedSet {
    key: MeasurementKey,
    entries: Vec<f64>,
    #[serde(default)]
    notes: String,
}

impl TryFrom<PersistedSet> for MeasurementSet {
    type Error = MeasurementError;

    fn try_from(raw: PersistedSet) -> Result<Self, Self::Error> {
        Self::from_persisted(raw.key, raw.entries, raw.notes)
    }
}

impl From<MeasurementSet> for PersistedSet {
    fn from(set: MeasurementSet) -> Self {
        Self {
            key: set.key,
            entries: set.entries,
            notes: set.notes,
        }
    }
}

//
// ─── RECORDER ──────────────────────────────────────────────────────────────────
//

/// Per-session collection of measurement sets, one per opened table row.
///
/// A row only exists once the learner opens it (or writes to it), so "this
/// section was skipped" stays distinguishable from "every reading was 0 g".
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecorder {
    trial_count: usize,
    sets: BTreeMap<MeasurementKey, MeasurementSet>,
}

impl MeasurementRecorder {
    /// # Errors
    ///
    /// Returns `MeasurementError::InvalidTrialCount` when `trial_count` is zero.
    pub fn new(trial_count: usize) -> Result<Self, MeasurementError> {
        if trial_count == 0 {
            return Err(MeasurementError::InvalidTrialCount);
        }
        Ok(Self {
            trial_count,
            sets: BTreeMap::new(),
        })
    }

    /// Rebuild a recorder from restored sets.
    ///
    /// # Errors
    ///
    /// Returns `MeasurementError::LengthMismatch` if any set does not have
    /// exactly `trial_count` entries, or `MeasurementError::DuplicateRow` if
    /// two sets share a key.
    pub fn from_sets(
        trial_count: usize,
        sets: impl IntoIterator<Item = MeasurementSet>,
    ) -> Result<Self, MeasurementError> {
        let mut recorder = Self::new(trial_count)?;
        for set in sets {
            if set.trial_count() != trial_count {
                return Err(MeasurementError::LengthMismatch {
                    key: set.label(),
                    expected: trial_count,
                    actual: set.trial_count(),
                });
            }
            let key = set.key();
            if recorder.sets.insert(key, set).is_some() {
                return Err(MeasurementError::DuplicateRow { key: key.label() });
            }
        }
        Ok(recorder)
    }

    #[must_use]
    pub fn trial_count(&self) -> usize {
        self.trial_count
    }

    /// Open a row, creating a zero-filled set if it does not exist yet.
    pub fn open(&mut self, key: MeasurementKey) -> &mut MeasurementSet {
        let trial_count = self.trial_count;
        self.sets.entry(key).or_insert_with(|| MeasurementSet {
            key,
            entries: vec![MIN_MASS_GRAMS; trial_count],
            notes: String::new(),
            stats: DerivedStatistics {
                mean: MIN_MASS_GRAMS,
                std_dev: 0.0,
            },
        })
    }

    /// Record one balance reading.
    ///
    /// # Errors
    ///
    /// Returns `MeasurementError` for refused values or unknown trials; the
    /// recorder is unchanged in that case.
    pub fn set_entry(
        &mut self,
        key: MeasurementKey,
        trial_index: usize,
        value: f64,
    ) -> Result<DerivedStatistics, MeasurementError> {
        validate_mass(value)?;
        if trial_index >= self.trial_count {
            return Err(MeasurementError::TrialOutOfRange {
                index: trial_index,
                trial_count: self.trial_count,
            });
        }
        let set = self.open(key);
        set.set_entry(trial_index, value)?;
        Ok(set.statistics())
    }

    pub fn set_notes(&mut self, key: MeasurementKey, notes: impl Into<String>) {
        self.open(key).set_notes(notes);
    }

    #[must_use]
    pub fn get(&self, key: MeasurementKey) -> Option<&MeasurementSet> {
        self.sets.get(&key)
    }

    #[must_use]
    pub fn entries(&self, key: MeasurementKey) -> Option<&[f64]> {
        self.sets.get(&key).map(MeasurementSet::entries)
    }

    #[must_use]
    pub fn statistics(&self, key: MeasurementKey) -> Option<DerivedStatistics> {
        self.sets.get(&key).map(MeasurementSet::statistics)
    }

    /// Opened sets in instrument, then solution order.
    pub fn sets(&self) -> impl Iterator<Item = &MeasurementSet> {
        self.sets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::instrument::{Instrument, Solution};

    fn p200() -> MeasurementKey {
        MeasurementKey::new(Instrument::P200, Solution::RedFoodColoring)
    }

    #[test]
    fn refuses_out_of_range_values_and_keeps_previous_entry() {
        let mut recorder = MeasurementRecorder::new(3).unwrap();
        recorder.set_entry(p200(), 0, 0.2).unwrap();

        for bad in [-0.5, 2.5] {
            let err = recorder.set_entry(p200(), 0, bad).unwrap_err();
            assert_eq!(err, MeasurementError::OutOfRange { value: bad });
        }
        assert_eq!(recorder.get(p200()).unwrap().entries(), &[0.2, 0.0, 0.0]);
    }

    #[test]
    fn refuses_nan_and_infinity() {
        let mut recorder = MeasurementRecorder::new(3).unwrap();
        assert_eq!(
            recorder.set_entry(p200(), 1, f64::NAN),
            Err(MeasurementError::NotFinite)
        );
        assert_eq!(
            recorder.set_entry(p200(), 1, f64::INFINITY),
            Err(MeasurementError::NotFinite)
        );
        assert!(recorder.get(p200()).is_none());
    }

    #[test]
    fn accepts_the_range_boundaries() {
        let mut recorder = MeasurementRecorder::new(2).unwrap();
        recorder.set_entry(p200(), 0, MIN_MASS_GRAMS).unwrap();
        recorder.set_entry(p200(), 1, MAX_MASS_GRAMS).unwrap();
        assert_eq!(recorder.get(p200()).unwrap().entries(), &[0.0, 2.0]);
    }

    #[test]
    fn trial_index_is_bounded_by_trial_count() {
        let mut recorder = MeasurementRecorder::new(3).unwrap();
        let err = recorder.set_entry(p200(), 3, 0.2).unwrap_err();
        assert_eq!(
            err,
            MeasurementError::TrialOutOfRange {
                index: 3,
                trial_count: 3
            }
        );
    }

    #[test]
    fn statistics_follow_every_write() {
        let mut recorder = MeasurementRecorder::new(3).unwrap();
        assert!(recorder.statistics(p200()).is_none());

        recorder.open(p200());
        let opened = recorder.statistics(p200()).unwrap();
        assert_eq!(opened.mean, 0.0);
        assert_eq!(opened.std_dev, 0.0);

        recorder.set_entry(p200(), 0, 1.0).unwrap();
        recorder.set_entry(p200(), 1, 2.0).unwrap();
        let stats = recorder.set_entry(p200(), 2, 0.0).unwrap();
        assert!((stats.mean - 1.0).abs() < 1e-12);
        assert!((stats.std_dev - 1.0).abs() < 1e-12);
        assert_eq!(recorder.statistics(p200()), Some(stats));
    }

    #[test]
    fn entry_count_never_changes() {
        let mut recorder = MeasurementRecorder::new(5).unwrap();
        for trial in 0..5 {
            recorder.set_entry(p200(), trial, 0.2).unwrap();
        }
        assert_eq!(recorder.get(p200()).unwrap().trial_count(), 5);
    }

    #[test]
    fn zero_trial_count_is_rejected() {
        assert_eq!(
            MeasurementRecorder::new(0),
            Err(MeasurementError::InvalidTrialCount)
        );
    }

    #[test]
    fn restored_sets_must_match_trial_count() {
        let set = MeasurementSet::new(p200(), 3).unwrap();
        let err = MeasurementRecorder::from_sets(5, [set]).unwrap_err();
        assert!(matches!(
            err,
            MeasurementError::LengthMismatch {
                expected: 5,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn restored_sets_must_not_repeat_a_row() {
        let mut first = MeasurementSet::new(p200(), 3).unwrap();
        first.set_entry(0, 0.2).unwrap();
        let mut second = MeasurementSet::new(p200(), 3).unwrap();
        second.set_entry(0, 1.5).unwrap();

        let err = MeasurementRecorder::from_sets(3, [first, second]).unwrap_err();
        assert_eq!(
            err,
            MeasurementError::DuplicateRow {
                key: p200().label()
            }
        );
    }

    #[test]
    fn deserializing_revalidates_entries() {
        let json = r#"{"key":{"instrument":"P20","solution":"ViscousLiquid"},"entries":[0.02,3.0]}"#;
        let err = serde_json::from_str::<MeasurementSet>(json).unwrap_err();
        assert!(err.to_string().contains("outside the accepted range"));

        let ok = r#"{"key":{"instrument":"P20","solution":"ViscousLiquid"},"entries":[0.02,0.02]}"#;
        let set: MeasurementSet = serde_json::from_str(ok).unwrap();
        assert_eq!(set.statistics().mean, 0.02);
        assert_eq!(set.notes(), "");
    }
}
