use pipette_core::model::{MissingField, RecordError};

use super::service::WorksheetSession;

/// Aggregated view of worksheet completion, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub questions_total: usize,
    pub questions_answered: usize,
    pub rows_total: usize,
    pub rows_opened: usize,
    pub submittable: bool,
    /// Fields still blocking submission; empty for the practice worksheet.
    pub missing: Vec<MissingField>,
}

impl SessionProgress {
    pub(super) fn of(session: &WorksheetSession) -> Self {
        let variant = session.variant();
        let answers = session.answers();

        let choice_answered = variant
            .choice_questions()
            .iter()
            .filter(|q| answers.choice(**q).is_some())
            .count();
        let text_answered = variant
            .text_questions()
            .iter()
            .filter(|q| answers.text(**q).is_some_and(|t| !t.trim().is_empty()))
            .count();

        let keys = variant.measurement_keys();
        let rows_opened = keys
            .iter()
            .filter(|key| session.measurements().get(**key).is_some())
            .count();

        let missing = match session.progress_draft().build() {
            Err(RecordError::MissingData(fields)) if variant.is_submittable() => fields,
            _ => Vec::new(),
        };

        Self {
            questions_total: variant.choice_questions().len() + variant.text_questions().len(),
            questions_answered: choice_answered + text_answered,
            rows_total: keys.len(),
            rows_opened,
            submittable: variant.is_submittable(),
            missing,
        }
    }

    #[must_use]
    pub fn is_ready_to_submit(&self) -> bool {
        self.submittable && self.missing.is_empty()
    }
}
