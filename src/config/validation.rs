use crate::case::CaseId;
use crate::collector::render_case_url;
use crate::config::types::{
    BoundaryConfig, CollectorConfig, Config, ExtractorConfig, OriginConfig, OutputConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_collector_config(&config.collector)?;
    validate_boundary_config(&config.boundary)?;
    validate_origin_config(&config.origin, &config.collector.prefix)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_extractor_config(&config.extractor)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates batch collection settings
fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    if config.prefix.is_empty()
        || !config
            .prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ConfigError::Validation(format!(
            "prefix must be non-empty and alphanumeric, got '{}'",
            config.prefix
        )));
    }

    if config.retry_limit < 1 {
        return Err(ConfigError::Validation(
            "retry_limit must be >= 1".to_string(),
        ));
    }

    if config.max_delay_ms < config.min_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_delay_ms ({}) must be >= min_delay_ms ({})",
            config.max_delay_ms, config.min_delay_ms
        )));
    }

    if config.max_consecutive_no_record < 1 {
        return Err(ConfigError::Validation(
            "max_consecutive_no_record must be >= 1".to_string(),
        ));
    }

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(
            "progress_interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates boundary search constants
fn validate_boundary_config(config: &BoundaryConfig) -> Result<(), ConfigError> {
    let constants = [
        ("confirmation_margin", config.confirmation_margin),
        ("backward_stride", config.backward_stride),
        ("trailing_window", config.trailing_window),
        ("max_id", config.max_id),
        ("max_probes", config.max_probes),
    ];

    for (name, value) in constants {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates the origin URL template by rendering a sample id
fn validate_origin_config(config: &OriginConfig, prefix: &str) -> Result<(), ConfigError> {
    if !config.case_url.contains('{') {
        return Err(ConfigError::Validation(format!(
            "case_url must contain an id placeholder, got '{}'",
            config.case_url
        )));
    }

    let sample = CaseId::new(prefix, 1, 0)
        .map_err(|e| ConfigError::Validation(format!("Invalid prefix: {}", e)))?;
    let url = render_case_url(&config.case_url, &sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid case_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "case_url must use HTTP or HTTPS, got '{}'",
            url.scheme()
        )));
    }

    if matches!(&config.not_found_marker, Some(marker) if marker.is_empty()) {
        return Err(ConfigError::Validation(
            "not_found_marker cannot be empty when set".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates that every extractor selector parses
fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    for selector in [
        &config.title_selector,
        &config.header_row_selector,
        &config.docket_row_selector,
    ] {
        Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
            selector: selector.clone(),
            message: format!("{:?}", e),
        })?;
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> CollectorConfig {
        CollectorConfig {
            prefix: "IMM".to_string(),
            retry_limit: 3,
            min_delay_ms: 1000,
            max_delay_ms: 3000,
            max_consecutive_no_record: 50,
            progress_interval: 25,
            lock_stale_secs: 3600,
        }
    }

    fn origin(case_url: &str) -> OriginConfig {
        OriginConfig {
            case_url: case_url.to_string(),
            not_found_marker: None,
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_validate_collector() {
        assert!(validate_collector_config(&collector()).is_ok());

        let mut bad = collector();
        bad.retry_limit = 0;
        assert!(validate_collector_config(&bad).is_err());

        let mut bad = collector();
        bad.max_delay_ms = 500;
        assert!(validate_collector_config(&bad).is_err());

        let mut bad = collector();
        bad.prefix = "IM-M".to_string();
        assert!(validate_collector_config(&bad).is_err());

        let mut bad = collector();
        bad.max_consecutive_no_record = 0;
        assert!(validate_collector_config(&bad).is_err());
    }

    #[test]
    fn test_validate_boundary() {
        assert!(validate_boundary_config(&BoundaryConfig::default()).is_ok());

        let bad = BoundaryConfig {
            backward_stride: 0,
            ..BoundaryConfig::default()
        };
        assert!(matches!(
            validate_boundary_config(&bad),
            Err(ConfigError::Validation(message)) if message.contains("backward_stride")
        ));
    }

    #[test]
    fn test_validate_origin() {
        assert!(validate_origin_config(
            &origin("https://court.example/cases?court_no={case_id}"),
            "IMM"
        )
        .is_ok());
        assert!(validate_origin_config(&origin("https://court.example/cases"), "IMM").is_err());
        assert!(matches!(
            validate_origin_config(&origin("court.example/{case_id}"), "IMM"),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(validate_origin_config(&origin("ftp://court.example/{case_id}"), "IMM").is_err());
    }

    #[test]
    fn test_validate_extractor() {
        let config = ExtractorConfig {
            title_selector: "h2".to_string(),
            header_row_selector: "table.header tr".to_string(),
            docket_row_selector: "table.docket tr".to_string(),
        };
        assert!(validate_extractor_config(&config).is_ok());

        let bad = ExtractorConfig {
            docket_row_selector: "tr[".to_string(),
            ..config
        };
        assert!(matches!(
            validate_extractor_config(&bad),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }
}
