//! Runs saved to a file-backed SQLite sink

mod common;

use common::{orchestrator, region_marker, FIXTURE_ENTITIES};
use senkyo::data::EntityKind;
use senkyo::storage::UpdateStatus;
use senkyo::{MockClient, OpenSink, ResultSink, RunResult, SqliteSink};
use tempfile::TempDir;

fn temp_sink() -> (TempDir, SqliteSink) {
    let dir = TempDir::new().unwrap();
    let sink = SqliteSink::open(dir.path().join("nested").join("senkyo.db")).unwrap();
    (dir, sink)
}

#[tokio::test]
async fn run_and_save_persists_every_success() {
    let (_dir, sink) = temp_sink();
    let (orchestrator, _mock) = orchestrator(MockClient::new(), 3);

    let (result, saved) = orchestrator.run_and_save(&sink, None).await;
    let run_id = saved.unwrap();
    assert!(result.errors.is_empty());

    let logs = sink.update_logs(10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].run_id, run_id);
    assert_eq!(logs[0].status, UpdateStatus::Completed);
    assert_eq!(logs[0].api_calls, 18);
    assert!(logs[0].completed_at.is_some());

    assert_eq!(sink.latest_predictions(EntityKind::Regional).unwrap().len(), 3);
    assert_eq!(sink.latest_predictions(EntityKind::Block).unwrap().len(), 2);

    let national = sink
        .latest_prediction(EntityKind::National, "national")
        .unwrap()
        .unwrap();
    assert_eq!(national.search_raw, MockClient::SEARCH_REPORT);
    assert_eq!(national.citations, vec![MockClient::CITATION.to_string()]);
    assert_eq!(national.forecast["cabinet_approval"], 35.5);
}

#[tokio::test]
async fn failed_entities_are_logged_not_stored() {
    let (_dir, sink) = temp_sink();
    let mock = MockClient::new().fail_search_with_status(region_marker("ベータ県"), 500);
    let (orchestrator, _mock) = orchestrator(mock, 3);

    let (result, saved) = orchestrator.run_and_save(&sink, None).await;
    saved.unwrap();
    assert_eq!(result.succeeded(), FIXTURE_ENTITIES - 1);

    assert!(sink
        .latest_prediction(EntityKind::Regional, "beta")
        .unwrap()
        .is_none());
    let logs = sink.update_logs(1).unwrap();
    assert_eq!(logs[0].status, UpdateStatus::Completed);
    assert_eq!(logs[0].errors, result.errors);
}

#[tokio::test]
async fn seat_projection_sums_districts_and_blocks() {
    let (_dir, sink) = temp_sink();
    let (orchestrator, _mock) = orchestrator(MockClient::new(), 3);
    orchestrator.run_and_save(&sink, None).await.1.unwrap();

    let projection = sink.seat_projection().unwrap();
    // One district winner per mock regional forecast, all "ldp".
    assert_eq!(projection.district_seats.get("ldp"), Some(&3));
    // Two blocks at {ldp: 3, chudou: 2, ishin: 1}.
    assert_eq!(projection.proportional_seats.get("ldp"), Some(&6.0));
    assert_eq!(projection.proportional_seats.get("chudou"), Some(&4.0));
    assert_eq!(projection.total_seats.get("ldp"), Some(&9.0));
    assert_eq!(projection.total_seats.get("ishin"), Some(&2.0));
    assert!(projection.updated_at.is_some());
}

#[tokio::test]
async fn partial_run_is_saved_as_its_own_log() {
    let (_dir, sink) = temp_sink();
    let (orchestrator, _mock) = orchestrator(MockClient::new(), 3);

    let report = orchestrator
        .run_blocks(&["south".to_string()], None)
        .await
        .unwrap();
    let result = RunResult::from(report);
    assert!(result.national.is_none());
    sink.save_run(&result).unwrap();

    assert_eq!(sink.latest_predictions(EntityKind::Block).unwrap().len(), 1);
    assert!(sink.latest_predictions(EntityKind::Regional).unwrap().is_empty());
    assert_eq!(sink.update_logs(10).unwrap()[0].api_calls, 3);
}

#[tokio::test]
async fn reopened_database_keeps_history() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("senkyo.db");
    let (orchestrator, _mock) = orchestrator(MockClient::new(), 3);

    {
        let sink = SqliteSink::open(&path).unwrap();
        orchestrator.run_and_save(&sink, None).await.1.unwrap();
    }
    let sink = SqliteSink::open(&path).unwrap();
    orchestrator.run_and_save(&sink, None).await.1.unwrap();

    assert_eq!(sink.update_logs(10).unwrap().len(), 2);
    // Latest only: still one row per target.
    assert_eq!(sink.latest_predictions(EntityKind::Regional).unwrap().len(), 3);
}
