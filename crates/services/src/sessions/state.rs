use serde::{Deserialize, Serialize};

/// Lifecycle of one learner's worksheet.
///
/// `Unidentified -> InProgress -> Submitted | Abandoned`. Both end states are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No learner name entered yet.
    Unidentified,
    /// Collecting answers and measurements.
    InProgress,
    /// Record appended to the progress sheet.
    Submitted,
    /// Session ended without a submission.
    Abandoned,
}

impl SessionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Submitted | SessionState::Abandoned)
    }
}
