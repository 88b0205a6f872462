//! HTTP prober implementation
//!
//! This module handles all requests to the origin service, including:
//! - Building HTTP clients with proper user agent strings
//! - Rendering the case URL template for an id
//! - Classifying responses into exists / not found / transient

use crate::case::CaseId;
use crate::collector::prober::{CaseDocument, ProbeResponse, Prober};
use crate::config::{OriginConfig, UserAgentConfig};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout_secs` - Total request timeout
///
/// # Example
///
/// ```no_run
/// use docket_sweep::config::UserAgentConfig;
/// use docket_sweep::collector::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "DocketSweep".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, 30).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout_secs: u64) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renders the case URL template for an id
///
/// Supported placeholders: `{case_id}`, `{prefix}`, `{number}`, `{year}`.
pub fn render_case_url(template: &str, id: &CaseId) -> Result<Url, url::ParseError> {
    let rendered = template
        .replace("{case_id}", &id.to_string())
        .replace("{prefix}", id.prefix())
        .replace("{number}", &id.number().to_string())
        .replace("{year}", &format!("{:02}", id.year()));
    Url::parse(&rendered)
}

/// Probes the origin service over HTTP
///
/// # Classification
///
/// | Response | Outcome |
/// |----------|---------|
/// | 2xx, body without not-found marker | Exists |
/// | 2xx, body contains not-found marker | NotFound |
/// | HTTP 404 / 410 | NotFound |
/// | HTTP 429, 5xx, other statuses | TransientError |
/// | Timeout, connection or body read error | TransientError |
pub struct HttpProber {
    client: Client,
    case_url: String,
    not_found_marker: Option<String>,
}

impl HttpProber {
    pub fn new(origin: &OriginConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent, origin.timeout_secs)?,
            case_url: origin.case_url.clone(),
            not_found_marker: origin.not_found_marker.clone(),
        })
    }
}

impl Prober for HttpProber {
    async fn probe(&mut self, id: &CaseId) -> ProbeResponse {
        let url = match render_case_url(&self.case_url, id) {
            Ok(url) => url,
            Err(e) => return ProbeResponse::TransientError(format!("Invalid case URL: {}", e)),
        };

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let message = if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    "Connection refused".to_string()
                } else {
                    e.to_string()
                };
                return ProbeResponse::TransientError(message);
            }
        };

        let status = response.status();

        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return ProbeResponse::NotFound;
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return ProbeResponse::TransientError("HTTP 429 (rate limited)".to_string());
        }

        if !status.is_success() {
            return ProbeResponse::TransientError(format!("HTTP {}", status.as_u16()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return ProbeResponse::TransientError(e.to_string()),
        };

        if let Some(marker) = &self.not_found_marker {
            if body.contains(marker.as_str()) {
                return ProbeResponse::NotFound;
            }
        }

        ProbeResponse::Exists(CaseDocument {
            id: id.clone(),
            url: url.to_string(),
            body,
        })
    }
}
