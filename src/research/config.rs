//! Research configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! A missing API key is not an error here: the server still starts and
//! reports the remote API as unavailable on submission.

use std::time::Duration;

use crate::core::ProcessorTier;

/// Default Parallel API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.parallel.ai";
/// Placeholder value shipped in example `.env` files.
const PLACEHOLDER_API_KEY: &str = "your_parallel_api_key_here";
/// Default poll interval for full research tiers, in seconds.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
/// Default poll interval for the quick tier, in seconds.
const DEFAULT_QUICK_POLL_INTERVAL_SECS: u64 = 5;
/// Default HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
/// Default retry attempts per remote call.
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay for exponential retry backoff.
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Configuration for the research orchestrator and its remote client.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Parallel API key. `None` means the remote API is unavailable.
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Tier used when a request names none or an unknown one.
    pub default_processor: ProcessorTier,
    /// Delay between status polls for full research tiers.
    pub poll_interval: Duration,
    /// Delay between status polls for the quick tier.
    pub quick_poll_interval: Duration,
    /// HTTP request timeout.
    pub request_timeout: Duration,
    /// Retry attempts for retryable remote errors.
    pub max_retries: u32,
    /// Base delay for exponential retry backoff.
    pub retry_backoff: Duration,
    /// Deadline applied to jobs whose approval did not set one.
    pub max_wait: Option<Duration>,
    /// How long terminal jobs are kept before [`prune_expired`] may evict
    /// them. `None` keeps jobs for the life of the process.
    ///
    /// [`prune_expired`]: crate::research::Orchestrator::prune_expired
    pub retention: Option<Duration>,
    /// Approve every submission without asking.
    pub auto_approve: bool,
}

impl ResearchConfig {
    /// Creates a new builder for `ResearchConfig`.
    #[must_use]
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::builder().from_env().build()
    }

    /// Poll interval for a tier.
    #[must_use]
    pub const fn poll_interval_for(&self, tier: ProcessorTier) -> Duration {
        if tier.is_quick() {
            self.quick_poll_interval
        } else {
            self.poll_interval
        }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ResearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct ResearchConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    default_processor: Option<ProcessorTier>,
    poll_interval: Option<Duration>,
    quick_poll_interval: Option<Duration>,
    request_timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_backoff: Option<Duration>,
    max_wait: Option<Duration>,
    retention: Option<Duration>,
    auto_approve: Option<bool>,
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_secs)
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl ResearchConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var("PARALLEL_API_KEY").ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("PARALLEL_BASE_URL").ok();
        }
        if self.default_processor.is_none() {
            self.default_processor = std::env::var("DEFAULT_PROCESSOR")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.poll_interval.is_none() {
            self.poll_interval = env_secs("PARALLEL_POLL_INTERVAL_SECS");
        }
        if self.quick_poll_interval.is_none() {
            self.quick_poll_interval = env_secs("PARALLEL_QUICK_POLL_INTERVAL_SECS");
        }
        if self.request_timeout.is_none() {
            self.request_timeout = env_secs("PARALLEL_REQUEST_TIMEOUT_SECS");
        }
        if self.max_retries.is_none() {
            self.max_retries = std::env::var("PARALLEL_MAX_RETRIES")
                .ok()
                .and_then(|v| v.trim().parse().ok());
        }
        if self.max_wait.is_none() {
            self.max_wait = env_secs("PARALLEL_MAX_WAIT_SECS");
        }
        if self.retention.is_none() {
            self.retention = env_secs("PARALLEL_JOB_RETENTION_SECS");
        }
        if self.auto_approve.is_none() {
            self.auto_approve = env_flag("PARALLEL_AUTO_APPROVE");
        }
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the default processor tier.
    #[must_use]
    pub const fn default_processor(mut self, tier: ProcessorTier) -> Self {
        self.default_processor = Some(tier);
        self
    }

    /// Sets the full-research poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets the quick-tier poll interval.
    #[must_use]
    pub const fn quick_poll_interval(mut self, interval: Duration) -> Self {
        self.quick_poll_interval = Some(interval);
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the retry attempts for retryable remote errors.
    #[must_use]
    pub const fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    /// Sets the base retry backoff.
    #[must_use]
    pub const fn retry_backoff(mut self, delay: Duration) -> Self {
        self.retry_backoff = Some(delay);
        self
    }

    /// Sets the default worker deadline.
    #[must_use]
    pub const fn max_wait(mut self, wait: Duration) -> Self {
        self.max_wait = Some(wait);
        self
    }

    /// Sets the retention window for terminal jobs.
    #[must_use]
    pub const fn retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Enables or disables automatic approval.
    #[must_use]
    pub const fn auto_approve(mut self, yes: bool) -> Self {
        self.auto_approve = Some(yes);
        self
    }

    /// Builds the [`ResearchConfig`].
    ///
    /// Blank or placeholder API keys are treated as absent.
    #[must_use]
    pub fn build(self) -> ResearchConfig {
        let api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_API_KEY);

        ResearchConfig {
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            default_processor: self.default_processor.unwrap_or(ProcessorTier::DEFAULT),
            poll_interval: self
                .poll_interval
                .unwrap_or(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)),
            quick_poll_interval: self
                .quick_poll_interval
                .unwrap_or(Duration::from_secs(DEFAULT_QUICK_POLL_INTERVAL_SECS)),
            request_timeout: self
                .request_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            retry_backoff: self.retry_backoff.unwrap_or(DEFAULT_RETRY_BACKOFF),
            max_wait: self.max_wait,
            retention: self.retention,
            auto_approve: self.auto_approve.unwrap_or(false),
        }
    }
}
