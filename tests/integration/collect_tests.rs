//! End-to-end batch runs against a mock origin

use crate::common::{create_test_config, mount_case, mount_response, request_count, NOT_FOUND_MARKER};
use docket_sweep::collector::{BatchRequest, Collector, HtmlExtractor, HttpProber};
use docket_sweep::config::Config;
use docket_sweep::storage::{OutcomeStore, RunStatus, SqliteStorage};
use docket_sweep::{CaseId, IdStatus};
use std::path::Path;
use tempfile::TempDir;
use wiremock::{MockServer, ResponseTemplate};

type HttpCollector = Collector<HttpProber, HtmlExtractor, SqliteStorage>;

fn id(number: u32) -> CaseId {
    CaseId::new("IMM", number, 23).unwrap()
}

fn build_collector(config: Config) -> HttpCollector {
    let prober = HttpProber::new(&config.origin, &config.user_agent).expect("Failed to build prober");
    let extractor = HtmlExtractor::new(&config.extractor).expect("Failed to build extractor");
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .expect("Failed to open database");
    Collector::new(config, prober, extractor, storage).with_config_hash("test-hash")
}

fn db_path(dir: &TempDir) -> String {
    dir.path().join("docket.db").to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_locate_then_collect_full_year() {
    let server = MockServer::start().await;
    for number in 1..=12 {
        mount_case(&server, number).await;
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &db_path(&dir));
    let mut collector = build_collector(config);

    let report = collector
        .run(&BatchRequest::new(23))
        .await
        .expect("Run failed");

    let boundary = report.boundary.expect("Boundary should have been located");
    assert!(boundary.resolved);
    assert_eq!(boundary.high_water_mark, 12);
    assert!(report.warnings.is_empty());

    assert_eq!(report.stats.start_id, 1);
    assert_eq!(report.stats.end_id, 12);
    assert_eq!(report.stats.success, 12);
    assert_eq!(report.stats.no_record, 0);
    assert!(report.stats.is_consistent());

    let case = collector
        .storage()
        .get_case(&id(5))
        .unwrap()
        .expect("Case should be stored");
    assert_eq!(case.field("Court Number"), Some("IMM-5-23"));
    assert_eq!(case.docket.len(), 2);
    assert_eq!(case.docket[1].summary, "Application for leave filed");

    let run = collector.storage().get_run(report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.end_id, Some(12));

    // A second run reuses the cached boundary and probes nothing
    let requests_before = request_count(&server).await;
    let second = collector.run(&BatchRequest::new(23)).await.unwrap();
    assert_eq!(second.stats.skipped, 12);
    assert_eq!(second.stats.attempted, 0);
    assert_eq!(request_count(&server).await, requests_before);
}

#[tokio::test]
async fn test_resume_after_interruption() {
    let server = MockServer::start().await;
    for number in 1..=10 {
        mount_case(&server, number).await;
    }

    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);

    {
        let mut collector = build_collector(create_test_config(&server.uri(), &path));
        let request = BatchRequest {
            end: Some(6),
            ..BatchRequest::new(23)
        };
        let report = collector.run(&request).await.unwrap();
        assert_eq!(report.stats.success, 6);

        // Simulate a run that never finished
        collector.storage_mut().create_run(23, 7, "test-hash").unwrap();
    }

    let mut collector = build_collector(create_test_config(&server.uri(), &path));
    let request = BatchRequest {
        end: Some(10),
        ..BatchRequest::new(23)
    };
    let requests_before = request_count(&server).await;
    let report = collector.run(&request).await.unwrap();

    assert_eq!(report.stats.skipped, 6);
    assert_eq!(report.stats.success, 4);
    assert_eq!(request_count(&server).await - requests_before, 4);

    let runs = collector.storage().recent_runs(23, 10).unwrap();
    assert_eq!(runs.len(), 3);
    assert!(runs.iter().any(|run| run.status == RunStatus::Interrupted));
}

#[tokio::test]
async fn test_outcomes_are_classified_into_store() {
    let server = MockServer::start().await;
    mount_case(&server, 1).await;
    mount_response(
        &server,
        2,
        ResponseTemplate::new(200).set_body_string(format!("<p>{}</p>", NOT_FOUND_MARKER)),
    )
    .await;
    mount_response(
        &server,
        3,
        ResponseTemplate::new(200).set_body_string("<html><body>Under maintenance</body></html>"),
    )
    .await;
    mount_response(&server, 4, ResponseTemplate::new(503)).await;
    // id 5 falls through to wiremock's 404

    let dir = TempDir::new().unwrap();
    let mut collector = build_collector(create_test_config(&server.uri(), &db_path(&dir)));
    let request = BatchRequest {
        end: Some(5),
        ..BatchRequest::new(23)
    };
    let report = collector.run(&request).await.unwrap();

    assert_eq!(report.stats.success, 1);
    assert_eq!(report.stats.no_record, 2);
    assert_eq!(report.stats.failed, 0);
    assert_eq!(report.stats.unresolved, 2);
    assert!(report.stats.is_consistent());

    let storage = collector.storage();
    assert_eq!(storage.get(&id(1)).unwrap().status, IdStatus::Success);
    assert_eq!(storage.get(&id(2)).unwrap().status, IdStatus::NoRecord);
    assert_eq!(storage.get(&id(5)).unwrap().status, IdStatus::NoRecord);

    let malformed = storage.get(&id(3)).unwrap();
    assert_eq!(malformed.status, IdStatus::Failed);
    assert!(malformed
        .last_error
        .as_deref()
        .unwrap_or_default()
        .contains("no header fields"));

    let transient = storage.get(&id(4)).unwrap();
    assert_eq!(transient.status, IdStatus::Failed);
    assert_eq!(transient.attempts, 1);
    assert_eq!(transient.last_error.as_deref(), Some("HTTP 503"));
}

#[tokio::test]
async fn test_escalation_and_reset() {
    let server = MockServer::start().await;
    mount_case(&server, 1).await;
    mount_response(&server, 2, ResponseTemplate::new(503)).await;

    let dir = TempDir::new().unwrap();
    let mut collector = build_collector(create_test_config(&server.uri(), &db_path(&dir)));
    let request = BatchRequest {
        end: Some(2),
        ..BatchRequest::new(23)
    };

    let mut escalated = 0;
    for _ in 0..3 {
        escalated += collector.run(&request).await.unwrap().stats.failed;
    }
    assert_eq!(escalated, 1);

    // Escalated ids cost no requests
    let requests_before = request_count(&server).await;
    let report = collector.run(&request).await.unwrap();
    assert_eq!(report.stats.skipped, 2);
    assert_eq!(request_count(&server).await, requests_before);

    assert_eq!(collector.storage_mut().reset_failed(23).unwrap(), 1);
    assert_eq!(collector.storage().get(&id(2)).unwrap().status, IdStatus::Unknown);

    let report = collector.run(&request).await.unwrap();
    assert_eq!(report.stats.attempted, 1);
    assert_eq!(request_count(&server).await, requests_before + 1);
}
