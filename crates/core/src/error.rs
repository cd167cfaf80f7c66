use thiserror::Error;

use crate::model::{MeasurementError, QuizError, RecordError};
use crate::stats::StatsError;

/// Any validation failure raised by the worksheet domain.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Measurement(#[from] MeasurementError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Record(#[from] RecordError),
}
