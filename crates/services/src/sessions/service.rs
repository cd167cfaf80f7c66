use chrono::{DateTime, Utc};
use pipette_core::DerivedStatistics;
use pipette_core::model::{
    ChoiceQuestion, Instrument, MeasurementKey, MeasurementRecorder, MeasurementSet,
    ProgressRecord, ProgressRecordBuilder, QuizAnswers, SessionId, Solution, TextQuestion,
    WorksheetVariant, YesNo,
};
use serde::{Deserialize, Serialize};

use super::progress::SessionProgress;
use super::state::SessionState;
use crate::error::SessionError;

/// Who is filling in the worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Learner {
    pub name: String,
    #[serde(default)]
    pub partner: String,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one learner's worksheet.
///
/// Each public `&mut self` method handles one UI action. Input can be
/// collected before the learner has entered a name; once the session is
/// submitted or abandoned every handler returns `SessionError::Closed`.
#[derive(Debug, Clone)]
pub struct WorksheetSession {
    pub(super) id: SessionId,
    pub(super) variant: WorksheetVariant,
    pub(super) state: SessionState,
    pub(super) started_at: DateTime<Utc>,
    pub(super) finished_at: Option<DateTime<Utc>>,
    pub(super) learner: Option<Learner>,
    pub(super) answers: QuizAnswers,
    pub(super) recorder: MeasurementRecorder,
    pub(super) reflections: Vec<String>,
}

impl WorksheetSession {
    /// Start an empty worksheet.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Measurement` if the variant's trial count is invalid.
    pub fn new(
        variant: WorksheetVariant,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            id: SessionId::new(),
            variant,
            state: SessionState::Unidentified,
            started_at,
            finished_at: None,
            learner: None,
            answers: QuizAnswers::new(),
            recorder: MeasurementRecorder::new(variant.trial_count())?,
            reflections: vec![String::new(); variant.reflection_prompts().len()],
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn variant(&self) -> WorksheetVariant {
        self.variant
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn learner(&self) -> Option<&Learner> {
        self.learner.as_ref()
    }

    #[must_use]
    pub fn answers(&self) -> &QuizAnswers {
        &self.answers
    }

    #[must_use]
    pub fn reflections(&self) -> &[String] {
        &self.reflections
    }

    #[must_use]
    pub fn measurements(&self) -> &MeasurementRecorder {
        &self.recorder
    }

    #[must_use]
    pub fn statistics(&self, key: MeasurementKey) -> Option<DerivedStatistics> {
        self.recorder.statistics(key)
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            return Err(SessionError::Closed(self.state));
        }
        Ok(())
    }

    fn ensure_row(&self, key: MeasurementKey) -> Result<(), SessionError> {
        if self.variant.measurement_keys().contains(&key) {
            Ok(())
        } else {
            Err(SessionError::RowNotOnWorksheet {
                row: key.label(),
                variant: self.variant,
            })
        }
    }

    //
    // ─── HANDLERS ──────────────────────────────────────────────────────────────
    //

    /// Enter (or correct) the learner and partner names.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::BlankName` for an empty name, or
    /// `SessionError::Closed` on a finished session.
    pub fn identify(
        &mut self,
        name: impl Into<String>,
        partner: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(SessionError::BlankName);
        }
        self.learner = Some(Learner {
            name,
            partner: partner.into().trim().to_string(),
        });
        self.state = SessionState::InProgress;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError` if the question is not on this worksheet, the
    /// option is not offered, or the session is closed.
    pub fn answer_choice(
        &mut self,
        question: ChoiceQuestion,
        option: &str,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        if !self.variant.choice_questions().contains(&question) {
            return Err(SessionError::QuestionNotOnWorksheet(question, self.variant));
        }
        self.answers.answer_choice(question, option)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError` if the question is not on this worksheet or the
    /// session is closed.
    pub fn answer_text(
        &mut self,
        question: TextQuestion,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        if !self.variant.text_questions().contains(&question) {
            return Err(SessionError::TextQuestionNotOnWorksheet(
                question,
                self.variant,
            ));
        }
        self.answers.answer_text(question, text);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Closed` on a finished session.
    pub fn acknowledge_mistakes(&mut self, answer: YesNo) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.answers.acknowledge_mistakes(answer);
        Ok(())
    }

    /// Open a data-entry row so its (zero-filled) statistics exist.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the row is not on this worksheet or the
    /// session is closed.
    pub fn open_measurements(
        &mut self,
        key: MeasurementKey,
    ) -> Result<&MeasurementSet, SessionError> {
        self.ensure_open()?;
        self.ensure_row(key)?;
        Ok(self.recorder.open(key))
    }

    /// Record one balance reading and return the row's updated statistics.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Measurement` when the value is refused; the
    /// previous reading is kept.
    pub fn set_entry(
        &mut self,
        key: MeasurementKey,
        trial_index: usize,
        value: f64,
    ) -> Result<DerivedStatistics, SessionError> {
        self.ensure_open()?;
        self.ensure_row(key)?;
        let stats = self.recorder.set_entry(key, trial_index, value)?;
        Ok(stats)
    }

    /// # Errors
    ///
    /// Returns `SessionError` if the row is not on this worksheet or the
    /// session is closed.
    pub fn set_notes(
        &mut self,
        key: MeasurementKey,
        notes: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.ensure_row(key)?;
        self.recorder.set_notes(key, notes);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::ReflectionOutOfRange` past the last prompt.
    pub fn reflect(&mut self, index: usize, text: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_open()?;
        let count = self.reflections.len();
        let slot = self
            .reflections
            .get_mut(index)
            .ok_or(SessionError::ReflectionOutOfRange { index, count })?;
        *slot = text.into();
        Ok(())
    }

    /// End the session without submitting.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the session already ended.
    pub fn abandon(&mut self, at: DateTime<Utc>) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.state = SessionState::Abandoned;
        self.finished_at = Some(at);
        Ok(())
    }

    pub(super) fn mark_submitted(&mut self, at: DateTime<Utc>) {
        self.state = SessionState::Submitted;
        self.finished_at = Some(at);
    }

    //
    // ─── RECORD ────────────────────────────────────────────────────────────────
    //

    /// Statistics of the progress row for `instrument`, if it was opened.
    #[must_use]
    pub fn instrument_statistics(&self, instrument: Instrument) -> Option<DerivedStatistics> {
        self.recorder
            .statistics(MeasurementKey::new(instrument, Solution::RedFoodColoring))
    }

    /// Everything collected so far, laid out for the progress sheet.
    #[must_use]
    pub fn progress_draft(&self) -> ProgressRecordBuilder {
        let mut draft = ProgressRecord::builder();
        if let Some(learner) = &self.learner {
            draft = draft.name(learner.name.clone()).partner(learner.partner.clone());
        }
        for question in self.variant.choice_questions() {
            if let Some(option) = self.answers.choice(*question) {
                draft = draft.answer(*question, option);
            }
        }
        if let Some(answer) = self.answers.mistakes_acknowledged() {
            draft = draft.mistakes_acknowledged(answer);
        }
        for instrument in Instrument::ALL {
            if let Some(stats) = self.instrument_statistics(instrument) {
                draft = draft.statistics(instrument, stats);
            }
        }
        draft.reflections(self.reflections.iter().cloned())
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::of(self)
    }
}
