use std::sync::Arc;

use async_trait::async_trait;
use pipette_core::model::{
    CellValue, ChoiceQuestion, Column, Instrument, MeasurementKey, MissingField, Solution,
    WorksheetVariant, YesNo,
};
use pipette_core::time::fixed_now;
use services::sessions::{SessionSnapshot, SessionState, WorksheetSession};
use services::{Clock, ProgressSubmitter, SessionError, SubmitError, WorksheetService};
use storage::{InMemoryStore, SheetHandle, StorageError, TabularStore};

struct UnreachableStore;

#[async_trait]
impl TabularStore for UnreachableStore {
    async fn open_sheet(&self, _name: &str) -> Result<Arc<dyn SheetHandle>, StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }
}

fn service_over(store: Arc<dyn TabularStore>) -> WorksheetService {
    WorksheetService::new(
        Clock::fixed(fixed_now()),
        ProgressSubmitter::new(store, "Progress"),
    )
}

fn key(instrument: Instrument) -> MeasurementKey {
    MeasurementKey::new(instrument, Solution::RedFoodColoring)
}

fn answer_quiz(session: &mut WorksheetSession) {
    for question in WorksheetVariant::ProgressTracking.choice_questions() {
        session
            .answer_choice(*question, question.options()[0])
            .unwrap();
    }
    session.acknowledge_mistakes(YesNo::Yes).unwrap();
}

fn record_readings(session: &mut WorksheetSession, instrument: Instrument, readings: [f64; 5]) {
    for (trial, value) in readings.into_iter().enumerate() {
        session.set_entry(key(instrument), trial, value).unwrap();
    }
}

fn complete_session(service: &WorksheetService) -> WorksheetSession {
    let mut session = service.start(WorksheetVariant::ProgressTracking).unwrap();
    session.identify("Ada", "Grace").unwrap();
    answer_quiz(&mut session);
    record_readings(&mut session, Instrument::P20, [0.020; 5]);
    record_readings(&mut session, Instrument::P200, [0.199, 0.201, 0.200, 0.198, 0.202]);
    record_readings(&mut session, Instrument::P1000, [1.0, 0.99, 1.01, 1.0, 1.0]);
    session.reflect(0, "more consistent with the P200").unwrap();
    session
}

#[tokio::test]
async fn complete_worksheet_appends_one_row() {
    let store = InMemoryStore::new();
    let service = service_over(Arc::new(store.clone()));
    let mut session = complete_session(&service);
    assert!(session.progress().is_ready_to_submit());

    let record = service.submit(&mut session).await.unwrap();
    assert_eq!(session.state(), SessionState::Submitted);
    assert_eq!(session.finished_at(), Some(fixed_now()));

    let rows = store.rows("Progress").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], record.values());
    assert_eq!(rows[0][Column::Name.index()], CellValue::Text("Ada".into()));
    assert_eq!(record.get(Column::P20Mean).as_number(), Some(0.020));
    assert_eq!(record.get(Column::P20StdDev).as_number(), Some(0.0));
    assert_eq!(
        record.get(Column::MistakesAcknowledged).as_text(),
        Some("Yes")
    );

    assert!(matches!(
        service.submit(&mut session).await,
        Err(SessionError::Closed(SessionState::Submitted))
    ));
    assert!(matches!(
        session.set_entry(key(Instrument::P20), 0, 0.02),
        Err(SessionError::Closed(_))
    ));
}

#[tokio::test]
async fn submission_waits_for_every_instrument() {
    let store = InMemoryStore::new();
    let service = service_over(Arc::new(store.clone()));
    let mut session = service.start(WorksheetVariant::ProgressTracking).unwrap();
    session.identify("Ada", "").unwrap();
    answer_quiz(&mut session);
    record_readings(&mut session, Instrument::P20, [0.02; 5]);

    let progress = session.progress();
    assert_eq!(progress.rows_opened, 1);
    assert_eq!(
        progress.missing,
        vec![
            MissingField::Statistics(Instrument::P200),
            MissingField::Statistics(Instrument::P1000)
        ]
    );

    let err = service.submit(&mut session).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Submit(SubmitError::MissingData(ref fields)) if fields.len() == 2
    ));
    assert_eq!(session.state(), SessionState::InProgress);
    assert!(store.rows("Progress").unwrap().is_empty());

    // An opened but untouched row counts as measured at 0 g.
    session.open_measurements(key(Instrument::P200)).unwrap();
    session.open_measurements(key(Instrument::P1000)).unwrap();
    service.submit(&mut session).await.unwrap();
    let rows = store.rows("Progress").unwrap();
    assert_eq!(rows[0][Column::P1000Mean.index()], CellValue::Number(0.0));
}

#[tokio::test]
async fn identical_sessions_produce_duplicate_rows() {
    let store = InMemoryStore::new();
    let service = service_over(Arc::new(store.clone()));

    let mut first = complete_session(&service);
    let mut second = complete_session(&service);
    service.submit(&mut first).await.unwrap();
    service.submit(&mut second).await.unwrap();

    let rows = store.rows("Progress").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], rows[1]);
}

#[tokio::test]
async fn unreachable_store_keeps_the_session_open() {
    let service = service_over(Arc::new(UnreachableStore));
    let mut session = complete_session(&service);

    let err = service.submit(&mut session).await.unwrap_err();
    let SessionError::Submit(SubmitError::StoreUnavailable(source)) = err else {
        panic!("expected store failure");
    };
    assert!(source.is_unavailable());
    assert_eq!(session.state(), SessionState::InProgress);
    assert!(session.finished_at().is_none());

    // The learner's input survives and a later retry can succeed.
    let store = InMemoryStore::new();
    let retry = service_over(Arc::new(store.clone()));
    retry.submit(&mut session).await.unwrap();
    assert_eq!(store.rows("Progress").unwrap().len(), 1);
}

#[tokio::test]
async fn restored_snapshot_submits_the_same_row() {
    let store = InMemoryStore::new();
    let service = service_over(Arc::new(store.clone()));
    let session = complete_session(&service);

    let json = session.snapshot().to_json().unwrap();
    let mut restored = service
        .restore(SessionSnapshot::from_json(&json).unwrap())
        .unwrap();
    for instrument in Instrument::ALL {
        assert_eq!(
            restored.instrument_statistics(instrument),
            session.instrument_statistics(instrument)
        );
    }

    let from_restored = service.submit(&mut restored).await.unwrap();
    let expected = session.progress_draft().build().unwrap();
    assert_eq!(from_restored, expected);
}

#[tokio::test]
async fn abandoned_sessions_cannot_be_submitted() {
    let store = InMemoryStore::new();
    let service = service_over(Arc::new(store.clone()));
    let mut session = complete_session(&service);

    service.abandon(&mut session).unwrap();
    assert!(matches!(
        service.submit(&mut session).await,
        Err(SessionError::Closed(SessionState::Abandoned))
    ));
    assert!(matches!(
        session.answer_choice(ChoiceQuestion::SetVolume, ChoiceQuestion::SetVolume.options()[1]),
        Err(SessionError::Closed(_))
    ));
    assert!(store.rows("Progress").unwrap().is_empty());
}
