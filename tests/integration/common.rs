//! Shared fixtures for integration tests

use docket_sweep::config::{
    BoundaryConfig, CollectorConfig, Config, ExtractorConfig, OriginConfig, OutputConfig,
    UserAgentConfig,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const NOT_FOUND_MARKER: &str = "No case matches this court number";

/// Creates a test configuration pointing at a mock origin
pub fn create_test_config(base_url: &str, db_path: &str) -> Config {
    Config {
        collector: CollectorConfig {
            prefix: "IMM".to_string(),
            retry_limit: 3,
            min_delay_ms: 0, // No pacing in tests
            max_delay_ms: 0,
            max_consecutive_no_record: 50,
            progress_interval: 5,
            lock_stale_secs: 3600,
        },
        boundary: BoundaryConfig::default(),
        origin: OriginConfig {
            case_url: format!("{}/cases/{{case_id}}", base_url),
            not_found_marker: Some(NOT_FOUND_MARKER.to_string()),
            timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        extractor: ExtractorConfig {
            title_selector: "h2.style-of-cause".to_string(),
            header_row_selector: "table.case-header tr".to_string(),
            docket_row_selector: "table.docket tbody tr".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
    }
}

/// Renders a case page the extractor understands
pub fn case_page(case_id: &str) -> String {
    format!(
        r#"<html><body>
        <h2 class="style-of-cause">APPLICANT v. THE MINISTER ({case_id})</h2>
        <table class="case-header">
            <tr><th>Court Number:</th><td>{case_id}</td></tr>
            <tr><th>Type:</th><td>Immigration Matters</td></tr>
        </table>
        <table class="docket">
            <thead><tr><th>ID</th><th>Date Filed</th><th>Office</th><th>Summary</th></tr></thead>
            <tbody>
            <tr><td>2</td><td>2023-01-06</td><td>Toronto</td><td>Acknowledgment of receipt</td></tr>
            <tr><td>1</td><td>2023-01-04</td><td>Toronto</td><td>Application for leave filed</td></tr>
            </tbody>
        </table>
        </body></html>"#
    )
}

/// Mounts a case page for `IMM-<number>-23`
pub async fn mount_case(server: &MockServer, number: u32) {
    let case_id = format!("IMM-{}-23", number);
    Mock::given(method("GET"))
        .and(path(format!("/cases/{}", case_id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(case_page(&case_id)))
        .mount(server)
        .await;
}

/// Mounts a fixed response for `IMM-<number>-23`
pub async fn mount_response(server: &MockServer, number: u32, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/cases/IMM-{}-23", number)))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Number of requests the mock origin has seen so far
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}
