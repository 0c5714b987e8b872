//! Watcher configuration
//!
//! Defines all configurable parameters for the watcher: where the Tekton API
//! lives, which event to follow, and the polling/retry cadence.

use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;
use tekwatch_core::domain::endpoint::Endpoint;
use tekwatch_core::domain::log::LogDiffMode;

/// Dashboard service address used when `TEKTON_API` is not set
pub const DEFAULT_API: &str = "http://tekton-dashboard.tekton-pipelines:9097";

/// Namespace used when `TEKTON_NAMESPACE` is not set
pub const DEFAULT_NAMESPACE: &str = "tekton-pipelines";

/// Watcher configuration
///
/// All intervals and limits are configurable so the same binary can run
/// against a local cluster and a slow shared one.
#[derive(Debug, Clone)]
pub struct Config {
    /// Candidate API base addresses, in probing order
    pub endpoints: Vec<Endpoint>,

    /// Namespace the pipeline runs live in
    pub namespace: String,

    /// Trigger event id to follow
    pub trigger_id: Option<String>,

    /// Bearer token for the API (sent as `Authorization` and SSO header)
    pub token: Option<String>,

    /// Tracing filter directive for diagnostics
    pub log_level: Option<String>,

    /// How many failed lookups are tolerated before giving up
    pub retry_max: u32,

    /// Pause between lookups while the run is not found yet
    pub retry_interval: Duration,

    /// Pause between polls once the run is being streamed
    pub poll_interval: Duration,

    /// Upper bound for a single HTTP request
    pub request_timeout: Duration,

    /// Upper bound for the whole watch, unlimited when `None`
    pub watch_timeout: Option<Duration>,

    /// How new log text is separated from what was already printed
    pub log_diff: LogDiffMode,

    /// Stop at the first failed step instead of waiting for the run to finish
    pub fail_fast: bool,
}

impl Config {
    /// Creates a new configuration with defaults for one endpoint
    pub fn new(endpoints: Vec<Endpoint>, namespace: String) -> Self {
        Self {
            endpoints,
            namespace,
            trigger_id: None,
            token: None,
            log_level: None,
            retry_max: 100,
            retry_interval: Duration::from_secs(1),
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            watch_timeout: None,
            log_diff: LogDiffMode::default(),
            fail_fast: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognized environment variables:
    /// - TEKTON_API (optional, comma-separated list allowed)
    /// - TEKTON_NAMESPACE (optional, default: tekton-pipelines)
    /// - EVENT_ID (optional here, required before watching)
    /// - TEKTON_JWT (optional)
    /// - TEKWATCH_LOG_LEVEL (optional, tracing filter directive)
    /// - TEKWATCH_RETRY_MAX (optional, default: 100)
    /// - TEKWATCH_RETRY_INTERVAL (optional, milliseconds, default: 1000)
    /// - TEKWATCH_POLL_INTERVAL (optional, milliseconds, default: 5000)
    /// - TEKWATCH_REQUEST_TIMEOUT (optional, seconds, default: 30)
    /// - TEKWATCH_WATCH_TIMEOUT (optional, seconds, 0 = unlimited)
    /// - TEKWATCH_LOG_DIFF (optional, substring|prefix, default: substring)
    /// - TEKWATCH_FAIL_FAST (optional, true|false, default: false)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reads variables through `lookup`
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoints =
            Endpoint::parse_list(&var("TEKTON_API").unwrap_or_else(|| DEFAULT_API.to_string()));
        let namespace = var("TEKTON_NAMESPACE")
            .map(|ns| ns.trim().to_string())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let mut config = Self::new(endpoints, namespace);
        config.trigger_id = var("EVENT_ID").map(|id| id.trim().to_string());
        config.token = var("TEKTON_JWT");
        config.log_level = var("TEKWATCH_LOG_LEVEL");

        if let Some(retry_max) = parse_var(&var, "TEKWATCH_RETRY_MAX")? {
            config.retry_max = retry_max;
        }

        if let Some(ms) = parse_var::<u64, _>(&var, "TEKWATCH_RETRY_INTERVAL")? {
            config.retry_interval = Duration::from_millis(ms);
        }

        if let Some(ms) = parse_var::<u64, _>(&var, "TEKWATCH_POLL_INTERVAL")? {
            config.poll_interval = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_var::<u64, _>(&var, "TEKWATCH_REQUEST_TIMEOUT")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64, _>(&var, "TEKWATCH_WATCH_TIMEOUT")? {
            config.watch_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(mode) = var("TEKWATCH_LOG_DIFF") {
            config.log_diff = mode
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid TEKWATCH_LOG_DIFF")?;
        }

        if let Some(fail_fast) = parse_var(&var, "TEKWATCH_FAIL_FAST")? {
            config.fail_fast = fail_fast;
        }

        Ok(config)
    }

    /// Fills the trigger id from the command line when it was not configured
    ///
    /// `EVENT_ID` wins over the positional argument.
    pub fn with_positional_trigger(mut self, trigger_id: Option<String>) -> Self {
        if self.trigger_id.is_none() {
            self.trigger_id = trigger_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty());
        }
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.trigger_id.is_none() {
            anyhow::bail!("event ID required (set EVENT_ID or pass it as the first argument)");
        }

        if self.endpoints.is_empty() {
            anyhow::bail!("at least one API endpoint is required");
        }

        for endpoint in &self.endpoints {
            let url = endpoint.as_str();
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("endpoint '{}' must start with http:// or https://", url);
            }
        }

        if self.namespace.is_empty() {
            anyhow::bail!("namespace cannot be empty");
        }

        if self.retry_interval.is_zero() {
            anyhow::bail!("retry_interval must be greater than 0");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            vec![Endpoint::new(DEFAULT_API)],
            DEFAULT_NAMESPACE.to_string(),
        )
    }
}

/// Parses an optional variable, naming it in the error when it is malformed
fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: '{}'", key, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.endpoints, vec![Endpoint::new(DEFAULT_API)]);
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.retry_max, 100);
        assert_eq!(config.retry_interval, Duration::from_secs(1));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.watch_timeout, None);
        assert_eq!(config.log_diff, LogDiffMode::Substring);
        assert!(!config.fail_fast);
        assert!(config.trigger_id.is_none());
    }

    #[test]
    fn test_endpoint_list_from_env() {
        let config = Config::from_lookup(lookup(&[(
            "TEKTON_API",
            "http://a:9097, http://b:9097 ,,",
        )]))
        .unwrap();

        assert_eq!(
            config.endpoints,
            vec![Endpoint::new("http://a:9097"), Endpoint::new("http://b:9097")]
        );
    }

    #[test]
    fn test_overrides_from_env() {
        let config = Config::from_lookup(lookup(&[
            ("TEKTON_NAMESPACE", "ci"),
            ("EVENT_ID", "evt-1"),
            ("TEKTON_JWT", "token"),
            ("TEKWATCH_RETRY_MAX", "7"),
            ("TEKWATCH_RETRY_INTERVAL", "250"),
            ("TEKWATCH_POLL_INTERVAL", "2000"),
            ("TEKWATCH_WATCH_TIMEOUT", "600"),
            ("TEKWATCH_LOG_DIFF", "prefix"),
            ("TEKWATCH_FAIL_FAST", "true"),
        ]))
        .unwrap();

        assert_eq!(config.namespace, "ci");
        assert_eq!(config.trigger_id.as_deref(), Some("evt-1"));
        assert_eq!(config.token.as_deref(), Some("token"));
        assert_eq!(config.retry_max, 7);
        assert_eq!(config.retry_interval, Duration::from_millis(250));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.watch_timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.log_diff, LogDiffMode::Prefix);
        assert!(config.fail_fast);
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = Config::from_lookup(lookup(&[
            ("TEKTON_API", " "),
            ("EVENT_ID", ""),
            ("TEKTON_JWT", ""),
        ]))
        .unwrap();

        assert_eq!(config.endpoints, vec![Endpoint::new(DEFAULT_API)]);
        assert!(config.trigger_id.is_none());
        assert!(config.token.is_none());
    }

    #[test]
    fn test_malformed_number_names_variable() {
        let err = Config::from_lookup(lookup(&[("TEKWATCH_RETRY_MAX", "lots")])).unwrap_err();
        assert!(err.to_string().contains("TEKWATCH_RETRY_MAX"));
    }

    #[test]
    fn test_positional_trigger_only_fills_missing_value() {
        let config = Config::default().with_positional_trigger(Some("from-arg".to_string()));
        assert_eq!(config.trigger_id.as_deref(), Some("from-arg"));

        let config = Config::from_lookup(lookup(&[("EVENT_ID", "from-env")]))
            .unwrap()
            .with_positional_trigger(Some("from-arg".to_string()));
        assert_eq!(config.trigger_id.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Missing trigger id should fail
        assert!(config.validate().is_err());

        config.trigger_id = Some("evt-1".to_string());
        assert!(config.validate().is_ok());

        // Invalid URL should fail
        config.endpoints = vec![Endpoint::new("dashboard:9097")];
        assert!(config.validate().is_err());

        config.endpoints = Vec::new();
        assert!(config.validate().is_err());

        config.endpoints = vec![Endpoint::new("https://dashboard")];
        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
