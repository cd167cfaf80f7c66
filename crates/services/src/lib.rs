#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod sessions;
pub mod submitter;

pub use pipette_core::Clock;

pub use app_services::{AppServices, StoreBackend};
pub use error::{AppServicesError, SessionError, SubmitError};
pub use sessions::{
    Learner, MeasurementRow, SessionProgress, SessionSnapshot, SessionState, WorksheetService,
    WorksheetSession, measurement_table,
};
pub use submitter::ProgressSubmitter;
