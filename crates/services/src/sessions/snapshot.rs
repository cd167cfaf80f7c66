use chrono::{DateTime, Utc};
use pipette_core::model::{
    MeasurementRecorder, MeasurementSet, QuizAnswers, SessionId, WorksheetVariant,
};
use serde::{Deserialize, Serialize};

use super::service::{Learner, WorksheetSession};
use super::state::SessionState;
use crate::error::SessionError;

const SNAPSHOT_VERSION: u32 = 1;

/// Serializable copy of a whole session, for explicit save and restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub id: SessionId,
    pub variant: WorksheetVariant,
    pub state: SessionState,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub learner: Option<Learner>,
    #[serde(default)]
    pub answers: QuizAnswers,
    #[serde(default)]
    pub measurements: Vec<MeasurementSet>,
    #[serde(default)]
    pub reflections: Vec<String>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn capture(session: &WorksheetSession) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            id: session.id,
            variant: session.variant,
            state: session.state,
            started_at: session.started_at,
            finished_at: session.finished_at,
            learner: session.learner.clone(),
            answers: session.answers.clone(),
            measurements: session.recorder.sets().cloned().collect(),
            reflections: session.reflections.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidSnapshot` if serialization fails.
    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string_pretty(self).map_err(|e| SessionError::InvalidSnapshot(e.to_string()))
    }

    /// Parse a snapshot. Readings and quiz options are re-validated while
    /// deserializing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidSnapshot` for malformed JSON or
    /// out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        serde_json::from_str(json).map_err(|e| SessionError::InvalidSnapshot(e.to_string()))
    }

    /// Rebuild the live session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidSnapshot` if the snapshot does not fit
    /// its worksheet variant: unknown version, foreign or repeated rows,
    /// questions from the other worksheet, wrong trial or reflection counts,
    /// or a state without a learner.
    pub fn restore(self) -> Result<WorksheetSession, SessionError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SessionError::InvalidSnapshot(format!(
                "unsupported version {}",
                self.version
            )));
        }

        let keys = self.variant.measurement_keys();
        if let Some(foreign) = self.measurements.iter().find(|s| !keys.contains(&s.key())) {
            return Err(SessionError::InvalidSnapshot(format!(
                "{} is not a row of the {:?} worksheet",
                foreign.label(),
                self.variant
            )));
        }
        if let Some(question) = self
            .answers
            .choices()
            .map(|(q, _)| q)
            .find(|q| !self.variant.choice_questions().contains(q))
        {
            return Err(SessionError::InvalidSnapshot(format!(
                "{question:?} is not on the {:?} worksheet",
                self.variant
            )));
        }

        if let Some(question) = self
            .answers
            .texts()
            .map(|(q, _)| q)
            .find(|q| !self.variant.text_questions().contains(q))
        {
            return Err(SessionError::InvalidSnapshot(format!(
                "{question:?} is not on the {:?} worksheet",
                self.variant
            )));
        }

        let prompts = self.variant.reflection_prompts().len();
        if self.reflections.len() != prompts {
            return Err(SessionError::InvalidSnapshot(format!(
                "expected {prompts} reflections, found {}",
                self.reflections.len()
            )));
        }
        if self.state != SessionState::Unidentified && self.learner.is_none() {
            return Err(SessionError::InvalidSnapshot(format!(
                "{:?} session has no learner",
                self.state
            )));
        }

        let recorder = MeasurementRecorder::from_sets(self.variant.trial_count(), self.measurements)
            .map_err(|e| SessionError::InvalidSnapshot(e.to_string()))?;

        Ok(WorksheetSession {
            id: self.id,
            variant: self.variant,
            state: self.state,
            started_at: self.started_at,
            finished_at: self.finished_at,
            learner: self.learner,
            answers: self.answers,
            recorder,
            reflections: self.reflections,
        })
    }
}

impl WorksheetSession {
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipette_core::model::{
        ChoiceQuestion, Instrument, MeasurementKey, Solution, TextQuestion,
    };
    use pipette_core::time::fixed_now;

    fn practice() -> WorksheetSession {
        let mut session = WorksheetSession::new(WorksheetVariant::Practice, fixed_now()).unwrap();
        session.identify("Ada", "Grace").unwrap();
        let key = MeasurementKey::new(Instrument::P200, Solution::ViscousLiquid);
        session.set_entry(key, 0, 0.18).unwrap();
        session.set_entry(key, 1, 0.19).unwrap();
        session.set_entry(key, 2, 0.17).unwrap();
        session
            .answer_choice(ChoiceQuestion::Bubble, ChoiceQuestion::Bubble.options()[2])
            .unwrap();
        session.reflect(0, "slow plunger helps").unwrap();
        session
    }

    #[test]
    fn restored_session_matches_the_saved_one() {
        let session = practice();
        let json = session.snapshot().to_json().unwrap();
        let restored = SessionSnapshot::from_json(&json).unwrap().restore().unwrap();

        assert_eq!(restored.id(), session.id());
        assert_eq!(restored.state(), SessionState::InProgress);
        assert_eq!(restored.reflections(), session.reflections());
        assert_eq!(restored.answers(), session.answers());
        let key = MeasurementKey::new(Instrument::P200, Solution::ViscousLiquid);
        assert_eq!(restored.statistics(key), session.statistics(key));
    }

    #[test]
    fn trial_count_must_match_the_variant() {
        let mut snapshot = practice().snapshot();
        snapshot.variant = WorksheetVariant::ProgressTracking;
        snapshot.measurements.clear();
        snapshot.answers = QuizAnswers::new();
        snapshot.reflections = vec![String::new(); 2];
        snapshot.measurements.push(
            MeasurementSet::new(MeasurementKey::new(Instrument::P20, Solution::RedFoodColoring), 3)
                .unwrap(),
        );

        let err = snapshot.restore().unwrap_err();
        assert!(matches!(err, SessionError::InvalidSnapshot(_)));
    }

    #[test]
    fn foreign_rows_are_rejected() {
        let mut snapshot = practice().snapshot();
        snapshot.variant = WorksheetVariant::ProgressTracking;
        snapshot.reflections = vec![String::new(); 2];
        snapshot.answers = QuizAnswers::new();

        let err = snapshot.restore().unwrap_err();
        assert!(err.to_string().contains("Viscous Liquid"));
    }

    #[test]
    fn out_of_range_readings_fail_to_parse() {
        let json = practice().snapshot().to_json().unwrap().replace("0.18", "2.18");
        assert!(matches!(
            SessionSnapshot::from_json(&json),
            Err(SessionError::InvalidSnapshot(_))
        ));
    }

    fn tracking_with_p20() -> WorksheetSession {
        let mut session =
            WorksheetSession::new(WorksheetVariant::ProgressTracking, fixed_now()).unwrap();
        session.identify("Ada", "").unwrap();
        session
            .set_entry(MeasurementKey::new(Instrument::P20, Solution::RedFoodColoring), 0, 0.02)
            .unwrap();
        session
    }

    #[test]
    fn text_answers_from_the_other_worksheet_are_rejected() {
        let mut snapshot = tracking_with_p20().snapshot();
        snapshot
            .answers
            .answer_text(TextQuestion::StopDifference, "first stop measures");

        let err = snapshot.restore().unwrap_err();
        assert!(matches!(err, SessionError::InvalidSnapshot(_)));
        assert!(err.to_string().contains("StopDifference"));
    }

    #[test]
    fn repeated_rows_do_not_replace_earlier_readings() {
        let mut snapshot = tracking_with_p20().snapshot();
        let p20 = MeasurementKey::new(Instrument::P20, Solution::RedFoodColoring);
        let mut repeat = MeasurementSet::new(p20, 5).unwrap();
        repeat.set_entry(0, 1.5).unwrap();
        snapshot.measurements.push(repeat);

        let err = snapshot.restore().unwrap_err();
        assert!(matches!(err, SessionError::InvalidSnapshot(_)));
        assert!(err.to_string().contains("more than once"));
    }
}
