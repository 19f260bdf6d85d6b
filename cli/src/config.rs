//! Run configuration.
//!
//! A [`RunConfig`] is assembled once by the binary (command line first,
//! environment for whatever the command line leaves unset) and then passed
//! explicitly to the pipeline.
//!
//! | Variable                    | Meaning                          | Default                               |
//! |-----------------------------|----------------------------------|---------------------------------------|
//! | `DASHBOARD_BASE_URL`        | API root                         | `https://dashboard.meraki.com/api/v0` |
//! | `DASHBOARD_TIMEOUT_SECS`    | Per-request timeout (seconds)    | 30                                    |
//! | `DASHBOARD_ORG_CONCURRENCY` | Organizations dispatched at once | 1                                     |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::dispatch::DispatchOptions;
use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://dashboard.meraki.com/api/v0";
pub const DEFAULT_SUCCESS_LOG: &str = "runtime-success.csv";
pub const DEFAULT_FAIL_LOG: &str = "runtime-fail.csv";

/// Default per-request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "DASHBOARD_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "DASHBOARD_TIMEOUT_SECS";
pub const ENV_ORG_CONCURRENCY: &str = "DASHBOARD_ORG_CONCURRENCY";

/// Everything one run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub csv_path: PathBuf,
    /// Required unless `dry_run` is set.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Show the queue and ask before sending anything.
    pub confirm: bool,
    /// Validate offline only.
    pub dry_run: bool,
    /// Silence the stderr echo of log entries.
    pub quiet: bool,
    pub success_log: PathBuf,
    pub fail_log: PathBuf,
    /// Overall run deadline.
    pub timeout: Option<Duration>,
    /// Timeout for each HTTP request.
    pub request_timeout: Duration,
    pub org_concurrency: usize,
    pub abort_on_transport_error: bool,
}

impl RunConfig {
    /// Configuration with every default applied.
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            confirm: true,
            dry_run: false,
            quiet: false,
            success_log: PathBuf::from(DEFAULT_SUCCESS_LOG),
            fail_log: PathBuf::from(DEFAULT_FAIL_LOG),
            timeout: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            org_concurrency: 1,
            abort_on_transport_error: true,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Apply `DASHBOARD_*` variables from the process environment.
    pub fn from_env(self) -> Result<Self, ConfigError> {
        self.apply_env(|name| env::var(name).ok())
    }

    /// Apply `DASHBOARD_*` variables read through `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = read(ENV_BASE_URL) {
            self.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(value) = read(ENV_TIMEOUT_SECS) {
            let secs = parse_positive(ENV_TIMEOUT_SECS, &value)?;
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = read(ENV_ORG_CONCURRENCY) {
            self.org_concurrency = parse_positive(ENV_ORG_CONCURRENCY, &value)? as usize;
        }
        Ok(self)
    }

    /// Check the combination of settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_key = self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
        if !self.dry_run && !has_key {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            org_concurrency: self.org_concurrency.max(1),
            timeout: self.timeout,
            abort_on_transport_error: self.abort_on_transport_error,
        }
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value: value.to_string(),
        }),
    }
}
