use pipette_core::model::{ProgressRecord, WorksheetVariant};

use super::service::WorksheetSession;
use super::snapshot::SessionSnapshot;
use crate::Clock;
use crate::error::SessionError;
use crate::submitter::ProgressSubmitter;

/// Starts worksheets and drives them to submission.
#[derive(Clone)]
pub struct WorksheetService {
    clock: Clock,
    submitter: ProgressSubmitter,
}

impl WorksheetService {
    #[must_use]
    pub fn new(clock: Clock, submitter: ProgressSubmitter) -> Self {
        Self { clock, submitter }
    }

    #[must_use]
    pub fn submitter(&self) -> &ProgressSubmitter {
        &self.submitter
    }

    /// # Errors
    ///
    /// Returns `SessionError` if the variant cannot hold measurements.
    pub fn start(&self, variant: WorksheetVariant) -> Result<WorksheetSession, SessionError> {
        let session = WorksheetSession::new(variant, self.clock.now())?;
        tracing::debug!(session = %session.id(), ?variant, "worksheet started");
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidSnapshot` if the snapshot does not fit
    /// its worksheet.
    pub fn restore(&self, snapshot: SessionSnapshot) -> Result<WorksheetSession, SessionError> {
        let session = snapshot.restore()?;
        tracing::debug!(session = %session.id(), state = ?session.state(), "worksheet restored");
        Ok(session)
    }

    /// Build the progress record and append it to the sheet.
    ///
    /// On success the session becomes `Submitted`. On any failure it stays
    /// as it was, so the learner can fix the input or retry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` for a finished session,
    /// `SessionError::NotSubmittable` for the practice worksheet, and
    /// `SessionError::Submit` when data is missing or the store fails.
    pub async fn submit(
        &self,
        session: &mut WorksheetSession,
    ) -> Result<ProgressRecord, SessionError> {
        if session.state().is_terminal() {
            return Err(SessionError::Closed(session.state()));
        }
        if !session.variant().is_submittable() {
            return Err(SessionError::NotSubmittable(session.variant()));
        }

        match self.submitter.submit(session.progress_draft()).await {
            Ok(record) => {
                let now = self.clock.now();
                session.mark_submitted(now);
                tracing::info!(session = %session.id(), "worksheet submitted");
                Ok(record)
            }
            Err(err) => {
                tracing::debug!(session = %session.id(), error = %err, "submission not accepted");
                Err(err.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the session already ended.
    pub fn abandon(&self, session: &mut WorksheetSession) -> Result<(), SessionError> {
        session.abandon(self.clock.now())?;
        tracing::debug!(session = %session.id(), "worksheet abandoned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::SubmitError;
    use crate::sessions::SessionState;
    use pipette_core::time::fixed_now;
    use storage::InMemoryStore;

    fn service(store: &InMemoryStore) -> WorksheetService {
        WorksheetService::new(
            Clock::fixed(fixed_now()),
            ProgressSubmitter::new(Arc::new(store.clone()), "Progress"),
        )
    }

    #[tokio::test]
    async fn practice_worksheets_are_never_submitted() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let mut session = service.start(WorksheetVariant::Practice).unwrap();
        session.identify("Ada", "").unwrap();

        let err = service.submit(&mut session).await.unwrap_err();
        assert!(matches!(err, SessionError::NotSubmittable(WorksheetVariant::Practice)));
        assert_eq!(session.state(), SessionState::InProgress);
        assert!(store.rows("Progress").unwrap().is_empty());
    }

    #[tokio::test]
    async fn unidentified_learners_are_asked_for_a_name() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let mut session = service.start(WorksheetVariant::ProgressTracking).unwrap();

        let err = service.submit(&mut session).await.unwrap_err();
        let SessionError::Submit(SubmitError::MissingData(fields)) = err else {
            panic!("expected missing data");
        };
        assert_eq!(fields[0], pipette_core::model::MissingField::Name);
        assert_eq!(session.state(), SessionState::Unidentified);
    }
}
