// src/config.rs
//! Process configuration read from the environment (after `dotenvy`), plus the
//! TOML/JSON file reader shared by the source-table and tag-rule loaders.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::ingest::fetch::BROWSER_USER_AGENT;
use crate::ingest::RefreshLimits;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_REFRESH_CONCURRENCY: usize = 3;
const MAX_REFRESH_CONCURRENCY: usize = 5;

pub const ENV_REFRESH_INTERVAL_SECS: &str = "REFRESH_INTERVAL_SECS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_REFRESH_CONCURRENCY: &str = "REFRESH_CONCURRENCY";
pub const ENV_FETCH_USER_AGENT: &str = "FETCH_USER_AGENT";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub refresh_interval: Duration,
    pub fetch_timeout: Duration,
    pub refresh_concurrency: usize,
    pub user_agent: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            refresh_concurrency: DEFAULT_REFRESH_CONCURRENCY,
            user_agent: BROWSER_USER_AGENT.to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup. Unparsable values fall back to the
    /// default with a warning; numeric values are clamped to sane ranges.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval = parse_num(
            ENV_REFRESH_INTERVAL_SECS,
            get(ENV_REFRESH_INTERVAL_SECS),
            DEFAULT_REFRESH_INTERVAL_SECS,
        )
        .max(1);
        let timeout = parse_num(
            ENV_FETCH_TIMEOUT_SECS,
            get(ENV_FETCH_TIMEOUT_SECS),
            DEFAULT_FETCH_TIMEOUT_SECS,
        )
        .max(1);
        let concurrency = parse_num(
            ENV_REFRESH_CONCURRENCY,
            get(ENV_REFRESH_CONCURRENCY),
            DEFAULT_REFRESH_CONCURRENCY as u64,
        )
        .clamp(1, MAX_REFRESH_CONCURRENCY as u64) as usize;

        let user_agent = get(ENV_FETCH_USER_AGENT)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| BROWSER_USER_AGENT.to_string());

        let log_format = match get(ENV_LOG_FORMAT)
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        Self {
            refresh_interval: Duration::from_secs(interval),
            fetch_timeout: Duration::from_secs(timeout),
            refresh_concurrency: concurrency,
            user_agent,
            log_format,
        }
    }

    pub fn limits(&self) -> RefreshLimits {
        RefreshLimits {
            fetch_timeout: self.fetch_timeout,
            concurrency: self.refresh_concurrency,
        }
    }
}

fn parse_num(name: &str, raw: Option<String>, default: u64) -> u64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(env = name, value = %raw, default, "invalid numeric env; using default");
            default
        }
    }
}

/// Read a TOML or JSON config file. The extension is a hint only: the other
/// format is tried when the hinted one fails to parse.
pub(crate) fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_structured(&content, &ext).map_err(|reason| ConfigError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse_structured<T: DeserializeOwned>(s: &str, hint_ext: &str) -> Result<T, String> {
    if hint_ext == "json" {
        return match serde_json::from_str(s) {
            Ok(v) => Ok(v),
            Err(json_err) => toml::from_str(s).map_err(|_| json_err.to_string()),
        };
    }
    match toml::from_str(s) {
        Ok(v) => Ok(v),
        Err(toml_err) => serde_json::from_str(s).map_err(|_| toml_err.to_string()),
    }
}
