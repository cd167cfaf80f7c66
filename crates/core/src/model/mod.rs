mod ids;
mod instrument;
mod measurement;
mod quiz;
mod record;
mod variant;

pub use ids::{ParseIdError, SessionId};
pub use instrument::{Instrument, MeasurementKey, Solution, WATER_GRAMS_PER_UL};
pub use measurement::{
    MAX_MASS_GRAMS, MIN_MASS_GRAMS, MeasurementError, MeasurementRecorder, MeasurementSet,
    validate_mass,
};
pub use quiz::{ChoiceQuestion, QuizAnswers, QuizError, TextQuestion, YesNo};
pub use record::{
    CellValue, Column, MissingField, ProgressRecord, ProgressRecordBuilder, REFLECTION_COLUMNS,
    RecordError,
};
pub use variant::WorksheetVariant;
