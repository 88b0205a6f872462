use serde::Deserialize;

/// Main configuration structure for Docket-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub collector: CollectorConfig,
    #[serde(default)]
    pub boundary: BoundaryConfig,
    pub origin: OriginConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub extractor: ExtractorConfig,
    pub output: OutputConfig,
}

/// Batch collection behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Case id prefix (e.g., "IMM" for `IMM-45-23`)
    pub prefix: String,

    /// Failed attempts after which an id is escalated and no longer retried
    #[serde(rename = "retry-limit", default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Lower bound of the randomized pause after each request (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized pause after each request (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Consecutive missing ids that stop a run
    #[serde(
        rename = "max-consecutive-no-record",
        default = "default_max_consecutive_no_record"
    )]
    pub max_consecutive_no_record: u32,

    /// Log progress every this many ids
    #[serde(rename = "progress-interval", default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Seconds after which another process's lock may be taken over
    #[serde(rename = "lock-stale-secs", default = "default_lock_stale_secs")]
    pub lock_stale_secs: u64,
}

/// Boundary search constants
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoundaryConfig {
    /// Distance above a miss probed to tell a gap from the end of the range
    #[serde(rename = "confirmation-margin", default = "default_confirmation_margin")]
    pub confirmation_margin: u32,

    /// Step of the backward scan below the first confirmed miss
    #[serde(rename = "backward-stride", default = "default_backward_stride")]
    pub backward_stride: u32,

    /// Consecutive misses that end the forward refinement
    #[serde(rename = "trailing-window", default = "default_trailing_window")]
    pub trailing_window: u32,

    /// Highest id ever probed
    #[serde(rename = "max-id", default = "default_max_id")]
    pub max_id: u32,

    /// Probe budget for one search
    #[serde(rename = "max-probes", default = "default_max_probes")]
    pub max_probes: u32,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            confirmation_margin: default_confirmation_margin(),
            backward_stride: default_backward_stride(),
            trailing_window: default_trailing_window(),
            max_id: default_max_id(),
            max_probes: default_max_probes(),
        }
    }
}

/// Origin service endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct OriginConfig {
    /// Case page URL template; supports `{case_id}`, `{prefix}`, `{number}`, `{year}`
    #[serde(rename = "case-url")]
    pub case_url: String,

    /// Text whose presence in a 200 response means "no such case"
    #[serde(rename = "not-found-marker", default)]
    pub not_found_marker: Option<String>,

    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the collector
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the collector
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the collector
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for collector-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// CSS selectors for case pages
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    #[serde(rename = "title-selector")]
    pub title_selector: String,

    /// Rows of the header table; first cell is the label
    #[serde(rename = "header-row-selector")]
    pub header_row_selector: String,

    /// Rows of the docket table
    #[serde(rename = "docket-row-selector")]
    pub docket_row_selector: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_retry_limit() -> u32 {
    3
}

fn default_min_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    3000
}

fn default_max_consecutive_no_record() -> u32 {
    50
}

fn default_progress_interval() -> u64 {
    25
}

fn default_lock_stale_secs() -> u64 {
    6 * 60 * 60
}

fn default_confirmation_margin() -> u32 {
    50
}

fn default_backward_stride() -> u32 {
    100
}

fn default_trailing_window() -> u32 {
    25
}

fn default_max_id() -> u32 {
    100_000
}

fn default_max_probes() -> u32 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}
