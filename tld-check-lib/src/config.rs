//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `TC_*`
//! environment variables, merging them with proper precedence rules, and
//! applying the result to a [`CheckConfig`].
//!
//! Precedence, highest first: explicit CLI flags, environment, local
//! `./tld-check.toml`, home `~/.tld-check.toml`, XDG
//! `$XDG_CONFIG_HOME/tld-check/config.toml`, built-in defaults.

use crate::error::DomainCheckError;
use crate::pacing::PacingPolicy;
use crate::types::{CheckConfig, FailurePolicy};
use crate::utils::normalize_tld;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// timeout = "5s"
/// pacing_ms = 100
/// tlds = ["com", "io", "dev"]
///
/// [endpoints]
/// de = "https://rdap.denic.de/domain/{domain}"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for checker and CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Extra TLD to RDAP URL template rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<HashMap<String, String>>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Per-request timeout (as string, e.g., "5s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Fixed pause after each check; 0 disables pacing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pacing_ms: Option<u64>,

    /// Token-bucket rate; takes precedence over `pacing_ms`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_per_second: Option<f64>,

    /// Token-bucket burst size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst: Option<u32>,

    /// Default concurrency level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Requests in flight per RDAP host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_endpoint_concurrency: Option<usize>,

    /// TLDs checked when none are given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tlds: Option<Vec<String>>,

    /// User agent sent to RDAP servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Report failed lookups as unknown instead of available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,

    /// Default detailed info setting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_info: Option<bool>,

    /// Deadline for a whole batch (as string, e.g., "30s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,

    /// Retry once on HTTP 429
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_on_rate_limit: Option<bool>,
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if parsing fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            DomainCheckError::config(format!(
                "Failed to parse TOML configuration {}: {}",
                path.display(),
                e
            ))
        })?;

        self.validate_config(&config)?;
        tracing::debug!(path = %path.display(), "loaded configuration file");

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Files that exist but fail to parse or validate are reported as
    /// errors rather than skipped.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainCheckError> {
        let mut merged_config = FileConfig::default();

        // Lowest precedence first
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            merged_config = self.merge_configs(merged_config, config);
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./tld-check.toml", "./.tld-check.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Get the global configuration file path.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".tld-check.toml", "tld-check.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("tld-check").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    pacing_ms: higher_defaults.pacing_ms.or(lower_defaults.pacing_ms),
                    requests_per_second: higher_defaults
                        .requests_per_second
                        .or(lower_defaults.requests_per_second),
                    burst: higher_defaults.burst.or(lower_defaults.burst),
                    concurrency: higher_defaults.concurrency.or(lower_defaults.concurrency),
                    per_endpoint_concurrency: higher_defaults
                        .per_endpoint_concurrency
                        .or(lower_defaults.per_endpoint_concurrency),
                    tlds: higher_defaults.tlds.or(lower_defaults.tlds),
                    user_agent: higher_defaults.user_agent.or(lower_defaults.user_agent),
                    strict: higher_defaults.strict.or(lower_defaults.strict),
                    detailed_info: higher_defaults.detailed_info.or(lower_defaults.detailed_info),
                    deadline: higher_defaults.deadline.or(lower_defaults.deadline),
                    retry_on_rate_limit: higher_defaults
                        .retry_on_rate_limit
                        .or(lower_defaults.retry_on_rate_limit),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            endpoints: match (lower.endpoints, higher.endpoints) {
                (Some(mut lower_endpoints), Some(higher_endpoints)) => {
                    // Higher precedence wins for conflicts
                    lower_endpoints.extend(higher_endpoints);
                    Some(lower_endpoints)
                }
                (lower_endpoints, higher_endpoints) => higher_endpoints.or(lower_endpoints),
            },
        }
    }

    /// Validate a configuration for common issues.
    pub fn validate_config(&self, config: &FileConfig) -> Result<(), DomainCheckError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if !(1..=100).contains(&concurrency) {
                    return Err(DomainCheckError::config(
                        "Concurrency must be between 1 and 100",
                    ));
                }
            }

            if let Some(limit) = defaults.per_endpoint_concurrency {
                if !(1..=100).contains(&limit) {
                    return Err(DomainCheckError::config(
                        "per_endpoint_concurrency must be between 1 and 100",
                    ));
                }
            }

            for (key, value) in [("timeout", &defaults.timeout), ("deadline", &defaults.deadline)] {
                if let Some(value) = value {
                    match parse_duration_string(value) {
                        Some(duration) if duration.is_zero() => {
                            return Err(DomainCheckError::config(format!(
                                "{} must be greater than zero",
                                key
                            )));
                        }
                        Some(_) => {}
                        None => {
                            return Err(DomainCheckError::config(format!(
                                "Invalid {} format '{}'. Use format like '500ms', '5s', '2m'",
                                key, value
                            )));
                        }
                    }
                }
            }

            if let Some(rate) = defaults.requests_per_second {
                if !(rate > 0.0 && rate.is_finite()) {
                    return Err(DomainCheckError::config(
                        "requests_per_second must be a positive number",
                    ));
                }
            }

            if defaults.burst == Some(0) {
                return Err(DomainCheckError::config("burst must be at least 1"));
            }

            if let Some(tlds) = &defaults.tlds {
                for tld in tlds {
                    if normalize_tld(tld)?.is_none() {
                        return Err(DomainCheckError::config("Default TLDs cannot be empty"));
                    }
                }
            }

            if let Some(user_agent) = &defaults.user_agent {
                if user_agent.trim().is_empty() {
                    return Err(DomainCheckError::config("user_agent cannot be empty"));
                }
            }
        }

        if let Some(endpoints) = &config.endpoints {
            for (tld, template) in endpoints {
                normalize_tld(tld)?;
                if !(template.starts_with("https://") || template.starts_with("http://")) {
                    return Err(DomainCheckError::config(format!(
                        "Endpoint for '{}' must be an http(s) URL: {}",
                        tld, template
                    )));
                }
                if !template.contains("{domain}") {
                    return Err(DomainCheckError::config(format!(
                        "Endpoint for '{}' must contain a {{domain}} placeholder: {}",
                        tld, template
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via `TC_*`
/// environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub tlds: Option<Vec<String>>,
    pub timeout: Option<Duration>,
    pub pacing_ms: Option<u64>,
    pub deadline: Option<Duration>,
    pub user_agent: Option<String>,
    pub strict: Option<bool>,
    pub detailed_info: Option<bool>,
    pub json: Option<bool>,
    pub pretty: Option<bool>,
    pub config: Option<String>,
}

/// Load configuration from environment variables.
///
/// Parses all `TC_*` environment variables. Invalid values are logged as
/// warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    let mut env_config = EnvConfig::default();

    // TC_CONCURRENCY - concurrent domain checks
    if let Some(val) = env_value("TC_CONCURRENCY") {
        match val.parse::<usize>() {
            Ok(concurrency) if (1..=100).contains(&concurrency) => {
                env_config.concurrency = Some(concurrency);
            }
            _ => tracing::warn!("Invalid TC_CONCURRENCY='{}', must be 1-100", val),
        }
    }

    // TC_TLD - comma-separated TLD list
    if let Some(val) = env_value("TC_TLD") {
        let tlds = split_list(&val);
        if !tlds.is_empty() {
            env_config.tlds = Some(tlds);
        }
    }

    if let Some(val) = env_value("TC_TIMEOUT") {
        env_config.timeout = parse_duration_string(&val).filter(|d| !d.is_zero());
        if env_config.timeout.is_none() {
            tracing::warn!("Invalid TC_TIMEOUT='{}', use a non-zero value like '5s', '500ms'", val);
        }
    }

    if let Some(val) = env_value("TC_DEADLINE") {
        env_config.deadline = parse_duration_string(&val).filter(|d| !d.is_zero());
        if env_config.deadline.is_none() {
            tracing::warn!("Invalid TC_DEADLINE='{}', use a non-zero value like '30s', '2m'", val);
        }
    }

    if let Some(val) = env_value("TC_PACING_MS") {
        match val.parse::<u64>() {
            Ok(ms) => env_config.pacing_ms = Some(ms),
            Err(_) => tracing::warn!("Invalid TC_PACING_MS='{}', must be milliseconds", val),
        }
    }

    env_config.user_agent = env_value("TC_USER_AGENT");
    env_config.config = env_value("TC_CONFIG");
    env_config.strict = env_bool("TC_STRICT");
    env_config.detailed_info = env_bool("TC_DETAILED_INFO");
    env_config.json = env_bool("TC_JSON");
    env_config.pretty = env_bool("TC_PRETTY");

    tracing::debug!(?env_config, "environment configuration");
    env_config
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
    let val = env_value(name)?;
    let parsed = parse_bool(&val);
    if parsed.is_none() {
        tracing::warn!("Invalid {}='{}', use true/false", name, val);
    }
    parsed
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a duration string like "500ms", "5s", "2m".
///
/// A bare number is taken as seconds.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}

impl CheckConfig {
    /// Layer file configuration over this config.
    ///
    /// The file is expected to have passed [`ConfigManager::validate_config`].
    pub fn apply_file_config(mut self, file: &FileConfig) -> Self {
        if let Some(defaults) = &file.defaults {
            if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration_string) {
                self.timeout = timeout;
            }
            if let Some(deadline) = defaults.deadline.as_deref().and_then(parse_duration_string) {
                self.batch_deadline = Some(deadline);
            }
            if let Some(rate) = defaults.requests_per_second {
                self.pacing = PacingPolicy::TokenBucket {
                    rate_per_sec: rate,
                    burst: defaults.burst.unwrap_or(1),
                };
            } else if let Some(ms) = defaults.pacing_ms {
                self.pacing = PacingPolicy::from_millis(ms);
            }
            if let Some(concurrency) = defaults.concurrency {
                self = self.with_concurrency(concurrency);
            }
            if let Some(limit) = defaults.per_endpoint_concurrency {
                self = self.with_per_endpoint_concurrency(limit);
            }
            if let Some(tlds) = &defaults.tlds {
                self.default_tlds = tlds.clone();
            }
            if let Some(user_agent) = &defaults.user_agent {
                self.user_agent = user_agent.clone();
            }
            if let Some(strict) = defaults.strict {
                self.failure_policy = failure_policy(strict);
            }
            if let Some(detailed) = defaults.detailed_info {
                self.detailed_info = detailed;
            }
            if let Some(retry) = defaults.retry_on_rate_limit {
                self.retry_on_rate_limit = retry;
            }
        }

        if let Some(endpoints) = &file.endpoints {
            for (tld, template) in endpoints {
                self = self.with_endpoint(tld.as_str(), template.as_str());
            }
        }

        self
    }

    /// Layer environment configuration over this config.
    pub fn apply_env_config(mut self, env_config: &EnvConfig) -> Self {
        if let Some(concurrency) = env_config.concurrency {
            self = self.with_concurrency(concurrency);
        }
        if let Some(tlds) = &env_config.tlds {
            self.default_tlds = tlds.clone();
        }
        if let Some(timeout) = env_config.timeout {
            self.timeout = timeout;
        }
        if let Some(deadline) = env_config.deadline {
            self.batch_deadline = Some(deadline);
        }
        if let Some(ms) = env_config.pacing_ms {
            self.pacing = PacingPolicy::from_millis(ms);
        }
        if let Some(user_agent) = &env_config.user_agent {
            self.user_agent = user_agent.clone();
        }
        if let Some(strict) = env_config.strict {
            self.failure_policy = failure_policy(strict);
        }
        if let Some(detailed) = env_config.detailed_info {
            self.detailed_info = detailed;
        }
        self
    }
}

fn failure_policy(strict: bool) -> FailurePolicy {
    if strict {
        FailurePolicy::ReportUnknown
    } else {
        FailurePolicy::TreatAsAvailable
    }
}
