//! HTTP prober classification against a mock origin

use crate::common::{case_page, create_test_config, mount_case, mount_response, NOT_FOUND_MARKER};
use docket_sweep::collector::{HttpProber, ProbeOutcome, ProbeResponse, Prober};
use docket_sweep::CaseId;
use wiremock::{MockServer, ResponseTemplate};

fn id(number: u32) -> CaseId {
    CaseId::new("IMM", number, 23).unwrap()
}

async fn prober_for(server: &MockServer) -> HttpProber {
    let config = create_test_config(&server.uri(), ":memory:");
    HttpProber::new(&config.origin, &config.user_agent).expect("Failed to build prober")
}

#[tokio::test]
async fn test_existing_case_returns_document() {
    let server = MockServer::start().await;
    mount_case(&server, 45).await;
    let mut prober = prober_for(&server).await;

    match prober.probe(&id(45)).await {
        ProbeResponse::Exists(document) => {
            assert_eq!(document.id, id(45));
            assert_eq!(document.body, case_page("IMM-45-23"));
            assert!(document.url.ends_with("/cases/IMM-45-23"));
        }
        other => panic!("expected Exists, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_statuses_are_not_found() {
    let server = MockServer::start().await;
    mount_response(&server, 2, ResponseTemplate::new(410)).await;
    let mut prober = prober_for(&server).await;

    // Unmatched paths get wiremock's default 404
    assert_eq!(prober.probe(&id(1)).await.outcome(), ProbeOutcome::NotFound);
    assert_eq!(prober.probe(&id(2)).await.outcome(), ProbeOutcome::NotFound);
}

#[tokio::test]
async fn test_not_found_marker_in_ok_response() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        7,
        ResponseTemplate::new(200).set_body_string(format!(
            "<html><body><p>{}</p></body></html>",
            NOT_FOUND_MARKER
        )),
    )
    .await;
    let mut prober = prober_for(&server).await;

    assert_eq!(prober.probe(&id(7)).await.outcome(), ProbeOutcome::NotFound);
}

#[tokio::test]
async fn test_server_errors_are_transient() {
    let server = MockServer::start().await;
    mount_response(&server, 3, ResponseTemplate::new(503)).await;
    mount_response(&server, 4, ResponseTemplate::new(429)).await;
    mount_response(&server, 5, ResponseTemplate::new(403)).await;
    let mut prober = prober_for(&server).await;

    for number in [3, 4, 5] {
        assert_eq!(
            prober.probe(&id(number)).await.outcome(),
            ProbeOutcome::TransientError,
            "id {}",
            number
        );
    }

    match prober.probe(&id(4)).await {
        ProbeResponse::TransientError(message) => assert!(message.contains("429")),
        other => panic!("expected TransientError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_origin_is_transient() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    drop(server);

    let config = create_test_config(&base_url, ":memory:");
    let mut prober = HttpProber::new(&config.origin, &config.user_agent).unwrap();

    assert_eq!(
        prober.probe(&id(1)).await.outcome(),
        ProbeOutcome::TransientError
    );
}
