//! Shared error types for the services crate.

use thiserror::Error;

use pipette_core::model::{
    ChoiceQuestion, MeasurementError, MissingField, QuizError, RecordError, TextQuestion,
    WorksheetVariant,
};
use storage::StorageError;
use storage::sqlite::SqliteInitError;

use crate::sessions::SessionState;

/// Errors emitted by `ProgressSubmitter`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error("cannot submit yet, missing: {}", join(.0))]
    MissingData(Vec<MissingField>),
    #[error("progress store unavailable: {0}")]
    StoreUnavailable(#[source] StorageError),
    #[error(transparent)]
    Record(RecordError),
}

fn join(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<RecordError> for SubmitError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::MissingData(fields) => SubmitError::MissingData(fields),
            other => SubmitError::Record(other),
        }
    }
}

impl From<StorageError> for SubmitError {
    fn from(err: StorageError) -> Self {
        SubmitError::StoreUnavailable(err)
    }
}

/// Errors emitted by worksheet session handlers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session is {0:?} and accepts no more input")]
    Closed(SessionState),
    #[error("learner name cannot be empty")]
    BlankName,
    #[error("{0:?} is not on the {1:?} worksheet")]
    QuestionNotOnWorksheet(ChoiceQuestion, WorksheetVariant),
    #[error("{0:?} is not on the {1:?} worksheet")]
    TextQuestionNotOnWorksheet(TextQuestion, WorksheetVariant),
    #[error("{row} is not a row of the {variant:?} worksheet")]
    RowNotOnWorksheet {
        row: String,
        variant: WorksheetVariant,
    },
    #[error("reflection {index} does not exist (worksheet has {count})")]
    ReflectionOutOfRange { index: usize, count: usize },
    #[error("the {0:?} worksheet is not submitted")]
    NotSubmittable(WorksheetVariant),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error(transparent)]
    Measurement(#[from] MeasurementError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
