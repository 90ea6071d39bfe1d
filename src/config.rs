//! Configuration types for newsbrief

use crate::error::{Error, Result};
use crate::types::SummaryOverrides;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, str::FromStr, time::Duration};

/// Summary generation settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Token budget per chunk sent to the summarization model (default: 1000)
    #[serde(default = "default_max_chunk_tokens")]
    pub max_chunk_tokens: usize,

    /// Minimum number of hashtags (default: 2)
    #[serde(default = "default_min_hashtags")]
    pub min_hashtags: usize,

    /// Maximum number of hashtags (default: 4)
    #[serde(default = "default_max_hashtags")]
    pub max_hashtags: usize,

    /// Maximum words in the generated title (default: 7)
    #[serde(default = "default_max_title_words")]
    pub max_title_words: usize,

    /// Summarization model on the hub (default: "facebook/bart-large-cnn")
    #[serde(default = "default_model_name")]
    pub model_name: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: default_max_chunk_tokens(),
            min_hashtags: default_min_hashtags(),
            max_hashtags: default_max_hashtags(),
            max_title_words: default_max_title_words(),
            model_name: default_model_name(),
        }
    }
}

impl SummaryConfig {
    /// Copy of this config with every field present in `overrides` replaced
    pub fn with_overrides(&self, overrides: &SummaryOverrides) -> Self {
        Self {
            max_chunk_tokens: overrides.max_chunk_tokens.unwrap_or(self.max_chunk_tokens),
            min_hashtags: overrides.min_hashtags.unwrap_or(self.min_hashtags),
            max_hashtags: overrides.max_hashtags.unwrap_or(self.max_hashtags),
            max_title_words: overrides.max_title_words.unwrap_or(self.max_title_words),
            model_name: overrides
                .model_name
                .clone()
                .unwrap_or_else(|| self.model_name.clone()),
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> std::result::Result<(), (&'static str, String)> {
        if self.max_chunk_tokens < 16 {
            return Err(("max_chunk_tokens", "must be at least 16".into()));
        }
        if self.max_hashtags == 0 {
            return Err(("max_hashtags", "must be at least 1".into()));
        }
        if self.min_hashtags > self.max_hashtags {
            return Err((
                "min_hashtags",
                format!(
                    "must not exceed max_hashtags ({} > {})",
                    self.min_hashtags, self.max_hashtags
                ),
            ));
        }
        if self.max_title_words == 0 {
            return Err(("max_title_words", "must be at least 1".into()));
        }
        if self.model_name.trim().is_empty() {
            return Err(("model_name", "must not be empty".into()));
        }
        Ok(())
    }
}

/// Model hub connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the inference API (default: "https://api-inference.huggingface.co")
    #[serde(default = "default_hub_url")]
    pub hub_url: String,

    /// Bearer token for the hub (None = anonymous)
    #[serde(default)]
    pub hub_token: Option<String>,

    /// Sentiment classification model (None = keyword heuristic only)
    #[serde(default = "default_sentiment_model")]
    pub sentiment_model: Option<String>,

    /// Per-request timeout in seconds (default: 120)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hub_url: default_hub_url(),
            hub_token: None,
            sentiment_model: default_sentiment_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ModelConfig {
    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Background task processing settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskConfig {
    /// How long task records are kept after submission, in seconds (default: 3600)
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Interval between expiry sweeps, in seconds (default: 600)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Maximum jobs waiting for a worker (default: 64)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Number of worker loops (default: 1, serializes model access)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Upper bound for one summarization, in seconds (default: 300)
    #[serde(default = "default_processing_timeout_secs")]
    pub processing_timeout_secs: u64,

    /// How long shutdown waits for queued and running jobs, in seconds (default: 30)
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            queue_capacity: default_queue_capacity(),
            workers: default_workers(),
            processing_timeout_secs: default_processing_timeout_secs(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

impl TaskConfig {
    /// Retention window
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Sweep interval
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Per-task processing timeout
    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.processing_timeout_secs)
    }

    /// Shutdown drain timeout
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Bearer secret required on protected routes
    ///
    /// Without one the protected routes reject every request, unless
    /// `allow_unauthenticated` is set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Leave the protected routes open when no `api_key` is set (development only)
    #[serde(default)]
    pub allow_unauthenticated: bool,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            allow_unauthenticated: false,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Per-route rate limiting configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Quota for `POST /summarize` (default: "5/minute")
    #[serde(default = "default_submit_quota")]
    pub submit: RateQuota,

    /// Quota for `GET /task/{task_id}` (default: "10/hour")
    #[serde(default = "default_status_quota")]
    pub status: RateQuota,

    /// Quota for `POST /summarize/sync` (default: "2/minute")
    #[serde(default = "default_sync_quota")]
    pub sync: RateQuota,

    /// Client IPs exempt from rate limiting
    #[serde(default)]
    pub exempt_ips: Vec<std::net::IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            submit: default_submit_quota(),
            status: default_status_quota(),
            sync: default_sync_quota(),
            exempt_ips: Vec::new(),
        }
    }
}

/// Time unit of a [`RateQuota`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotaPeriod {
    /// One second
    Second,
    /// One minute
    Minute,
    /// One hour
    Hour,
    /// One day
    Day,
}

impl QuotaPeriod {
    /// Length of the period
    pub fn duration(self) -> Duration {
        match self {
            QuotaPeriod::Second => Duration::from_secs(1),
            QuotaPeriod::Minute => Duration::from_secs(60),
            QuotaPeriod::Hour => Duration::from_secs(3600),
            QuotaPeriod::Day => Duration::from_secs(86_400),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            QuotaPeriod::Second => "second",
            QuotaPeriod::Minute => "minute",
            QuotaPeriod::Hour => "hour",
            QuotaPeriod::Day => "day",
        }
    }
}

/// A request quota such as `5/minute`
///
/// Serialized as the string form, so config files and environment variables
/// share one notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RateQuota {
    /// Requests allowed per period
    pub requests: u32,
    /// Window length
    pub period: QuotaPeriod,
}

impl RateQuota {
    /// Build a quota
    pub const fn new(requests: u32, period: QuotaPeriod) -> Self {
        Self { requests, period }
    }
}

impl FromStr for RateQuota {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::Config {
            message: format!("invalid rate quota '{s}': {reason}"),
            key: None,
        };

        let (count, unit) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid("expected '<count>/<period>'"))?;
        let requests: u32 = count
            .trim()
            .parse()
            .map_err(|_| invalid("count is not a number"))?;
        if requests == 0 {
            return Err(invalid("count must be at least 1"));
        }
        let period = match unit.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "second" | "seconds" => QuotaPeriod::Second,
            "m" | "min" | "minute" | "minutes" => QuotaPeriod::Minute,
            "h" | "hour" | "hours" => QuotaPeriod::Hour,
            "d" | "day" | "days" => QuotaPeriod::Day,
            _ => return Err(invalid("unknown period")),
        };
        Ok(Self { requests, period })
    }
}

impl TryFrom<String> for RateQuota {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RateQuota> for String {
    fn from(quota: RateQuota) -> Self {
        quota.to_string()
    }
}

impl std::fmt::Display for RateQuota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.requests, self.period.as_str())
    }
}

/// Main configuration for newsbrief
///
/// - [`summary`](SummaryConfig) - summary shape and default model
/// - [`models`](ModelConfig) - model hub connection
/// - [`tasks`](TaskConfig) - queue, workers, retention
/// - [`server`](ServerIntegrationConfig) - REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Summary generation settings
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Model hub settings
    #[serde(default)]
    pub models: ModelConfig,

    /// Background task settings
    #[serde(default)]
    pub tasks: TaskConfig,

    /// API server settings
    #[serde(default)]
    pub server: ServerIntegrationConfig,

    /// Emit logs as JSON lines (default: false)
    #[serde(default)]
    pub log_json: bool,
}

impl Config {
    /// Load a JSON configuration file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {e}", path.display()),
            key: None,
        })?;
        serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("cannot parse {}: {e}", path.display()),
            key: None,
        })
    }

    /// Apply environment variable overrides
    ///
    /// - `API_KEY` - bearer secret
    /// - `RATE_LIMIT_REQUESTS` - quota for `POST /summarize`
    /// - `RATE_LIMIT_BURST` - quota for `GET /task/{task_id}`
    /// - `RATE_LIMIT_SYNC` - quota for `POST /summarize/sync`
    /// - `HF_API_TOKEN` - model hub token
    /// - `NEWSBRIEF_BIND` - API bind address
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(key) = env_var("API_KEY") {
            self.server.api.api_key = Some(key);
        }
        let limits = &mut self.server.api.rate_limit;
        if let Some(quota) = env_var("RATE_LIMIT_REQUESTS") {
            limits.submit = parse_env_quota("RATE_LIMIT_REQUESTS", &quota)?;
        }
        if let Some(quota) = env_var("RATE_LIMIT_BURST") {
            limits.status = parse_env_quota("RATE_LIMIT_BURST", &quota)?;
        }
        if let Some(quota) = env_var("RATE_LIMIT_SYNC") {
            limits.sync = parse_env_quota("RATE_LIMIT_SYNC", &quota)?;
        }
        if let Some(token) = env_var("HF_API_TOKEN") {
            self.models.hub_token = Some(token);
        }
        if let Some(bind) = env_var("NEWSBRIEF_BIND") {
            self.server.api.bind_address = bind.parse().map_err(|e| Error::Config {
                message: format!("invalid bind address '{bind}': {e}"),
                key: Some("NEWSBRIEF_BIND".into()),
            })?;
        }
        Ok(())
    }

    /// Check cross-field constraints before starting the service
    pub fn validate(&self) -> Result<()> {
        self.summary.validate().map_err(|(key, message)| Error::Config {
            message,
            key: Some(format!("summary.{key}")),
        })?;

        let checks: [(&str, bool, &str); 5] = [
            ("tasks.workers", self.tasks.workers >= 1, "must be at least 1"),
            (
                "tasks.queue_capacity",
                self.tasks.queue_capacity >= 1,
                "must be at least 1",
            ),
            (
                "tasks.retention_secs",
                self.tasks.retention_secs >= 1,
                "must be at least 1",
            ),
            (
                "tasks.sweep_interval_secs",
                self.tasks.sweep_interval_secs >= 1,
                "must be at least 1",
            ),
            (
                "tasks.processing_timeout_secs",
                self.tasks.processing_timeout_secs >= 1,
                "must be at least 1",
            ),
        ];
        for (key, ok, message) in checks {
            if !ok {
                return Err(Error::Config {
                    message: message.to_string(),
                    key: Some(key.to_string()),
                });
            }
        }

        if self
            .server
            .api
            .api_key
            .as_deref()
            .is_some_and(|k| k.trim().is_empty())
        {
            return Err(Error::Config {
                message: "api_key must not be blank".into(),
                key: Some("server.api.api_key".into()),
            });
        }

        url::Url::parse(&self.models.hub_url).map_err(|e| Error::Config {
            message: format!("invalid hub_url: {e}"),
            key: Some("models.hub_url".into()),
        })?;

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env_quota(name: &str, value: &str) -> Result<RateQuota> {
    value.parse().map_err(|e: Error| Error::Config {
        message: e.to_string(),
        key: Some(name.to_string()),
    })
}

fn default_max_chunk_tokens() -> usize {
    1000
}

fn default_min_hashtags() -> usize {
    2
}

fn default_max_hashtags() -> usize {
    4
}

fn default_max_title_words() -> usize {
    7
}

fn default_model_name() -> String {
    "facebook/bart-large-cnn".to_string()
}

fn default_hub_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_sentiment_model() -> Option<String> {
    Some("distilbert-base-uncased-finetuned-sst-2-english".to_string())
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    600
}

fn default_queue_capacity() -> usize {
    64
}

fn default_workers() -> usize {
    1
}

fn default_processing_timeout_secs() -> u64 {
    300
}

fn default_drain_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_submit_quota() -> RateQuota {
    RateQuota::new(5, QuotaPeriod::Minute)
}

fn default_status_quota() -> RateQuota {
    RateQuota::new(10, QuotaPeriod::Hour)
}

fn default_sync_quota() -> RateQuota {
    RateQuota::new(2, QuotaPeriod::Minute)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.tasks.retention(), Duration::from_secs(3600));
        assert_eq!(config.tasks.sweep_interval(), Duration::from_secs(600));
        assert_eq!(config.tasks.workers, 1);
        assert_eq!(config.summary.model_name, "facebook/bart-large-cnn");
        assert_eq!(config.server.api.rate_limit.submit.to_string(), "5/minute");
        assert_eq!(config.server.api.rate_limit.sync.to_string(), "2/minute");
        assert_eq!(config.server.api.rate_limit.status.to_string(), "10/hour");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rate_quota_parses_common_notations() {
        let cases = [
            ("5/minute", 5, QuotaPeriod::Minute),
            ("10/hour", 10, QuotaPeriod::Hour),
            (" 2 / Second ", 2, QuotaPeriod::Second),
            ("100/day", 100, QuotaPeriod::Day),
            ("3/m", 3, QuotaPeriod::Minute),
        ];
        for (input, requests, period) in cases {
            let quota: RateQuota = input.parse().unwrap();
            assert_eq!(quota, RateQuota::new(requests, period), "{input}");
        }
    }

    #[test]
    fn rate_quota_rejects_garbage() {
        for input in ["", "5", "five/minute", "0/minute", "5/fortnight"] {
            assert!(input.parse::<RateQuota>().is_err(), "{input} should fail");
        }
    }

    #[test]
    fn partial_json_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "summary": {{"max_hashtags": 6}},
                "tasks": {{"workers": 2}},
                "server": {{"api": {{"api_key": "s3cret", "rate_limit": {{"submit": "20/minute"}}}}}}
            }}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.summary.max_hashtags, 6);
        assert_eq!(config.summary.min_hashtags, 2);
        assert_eq!(config.tasks.workers, 2);
        assert_eq!(config.tasks.retention_secs, 3600);
        assert_eq!(config.server.api.api_key.as_deref(), Some("s3cret"));
        assert_eq!(
            config.server.api.rate_limit.submit,
            RateQuota::new(20, QuotaPeriod::Minute)
        );
        assert_eq!(
            config.server.api.rate_limit.sync,
            RateQuota::new(2, QuotaPeriod::Minute)
        );
    }

    #[test]
    fn unreadable_file_is_config_error() {
        let err = Config::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn validate_rejects_zero_workers_and_inverted_hashtag_bounds() {
        let mut config = Config::default();
        config.tasks.workers = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "tasks.workers"));

        let mut config = Config::default();
        config.summary.min_hashtags = 5;
        config.summary.max_hashtags = 3;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, Error::Config { key: Some(ref k), .. } if k == "summary.min_hashtags")
        );
    }

    #[test]
    fn overrides_replace_only_present_fields() {
        let base = SummaryConfig::default();
        let overrides = SummaryOverrides {
            max_title_words: Some(4),
            model_name: Some("sshleifer/distilbart-cnn-12-6".into()),
            ..Default::default()
        };
        let merged = base.with_overrides(&overrides);
        assert_eq!(merged.max_title_words, 4);
        assert_eq!(merged.model_name, "sshleifer/distilbart-cnn-12-6");
        assert_eq!(merged.max_hashtags, base.max_hashtags);
        assert_eq!(merged.max_chunk_tokens, base.max_chunk_tokens);
    }

    #[test]
    #[serial]
    fn env_overrides_api_key_and_quotas() {
        // SAFETY: serialized with other env-mutating tests
        unsafe {
            std::env::set_var("API_KEY", "from-env");
            std::env::set_var("RATE_LIMIT_REQUESTS", "7/minute");
            std::env::set_var("RATE_LIMIT_BURST", "30/hour");
        }

        let mut config = Config::default();
        let result = config.apply_env();

        unsafe {
            std::env::remove_var("API_KEY");
            std::env::remove_var("RATE_LIMIT_REQUESTS");
            std::env::remove_var("RATE_LIMIT_BURST");
        }

        result.unwrap();
        assert_eq!(config.server.api.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.server.api.rate_limit.submit.requests, 7);
        assert_eq!(
            config.server.api.rate_limit.status,
            RateQuota::new(30, QuotaPeriod::Hour)
        );
    }

    #[test]
    #[serial]
    fn env_with_bad_quota_names_the_variable() {
        unsafe {
            std::env::set_var("RATE_LIMIT_SYNC", "lots");
        }
        let mut config = Config::default();
        let result = config.apply_env();
        unsafe {
            std::env::remove_var("RATE_LIMIT_SYNC");
        }

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "RATE_LIMIT_SYNC"));
    }
}
