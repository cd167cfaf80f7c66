mod progress;
mod service;
mod snapshot;
mod state;
mod view;
mod workflow;

// Public API of the worksheet session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::{Learner, WorksheetSession};
pub use snapshot::SessionSnapshot;
pub use state::SessionState;
pub use view::{MeasurementRow, measurement_table};
pub use workflow::WorksheetService;
