//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Start from [`AnalyticsConfig::default`]
//! 2. If a config file is found, load it (JSON or TOML by extension)
//! 3. Overlay any `AGNOST_*` environment variables
//! 4. Validate the result
//!
//! ## Environment Variables
//! - `AGNOST_ORG_ID`: Organization id (read by [`load_org_id`])
//! - `AGNOST_ENDPOINT`: Collector base URL
//! - `AGNOST_DISABLE_INPUT` / `AGNOST_DISABLE_OUTPUT`: Privacy switches
//! - `AGNOST_ENABLE_REQUEST_QUEUING`: Background delivery (true/false)
//! - `AGNOST_DELIVERY_MODE`: `sequential` or `batched`
//! - `AGNOST_BATCH_SIZE`, `AGNOST_MAX_RETRIES`, `AGNOST_QUEUE_CAPACITY`
//! - `AGNOST_RETRY_DELAY_MS`, `AGNOST_REQUEST_TIMEOUT_MS`,
//!   `AGNOST_FLUSH_INTERVAL_MS`: Durations in milliseconds
//! - `AGNOST_LOG_LEVEL`: `debug`, `info`, `warning` or `error`
//!
//! ## File Locations
//! [`probe_config_paths`] looks for `agnost.json` then `agnost.toml` in the
//! current working directory.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use agnost_domain::{AgnostError, AnalyticsConfig, DeliveryMode, LogLevel, Result};

use crate::errors::InfraError;

/// Load configuration: probed file (if any), then environment overrides.
///
/// # Errors
/// Returns `AgnostError::Config` if a file or variable is malformed or the
/// result fails validation.
pub fn load() -> Result<AnalyticsConfig> {
    let base = match probe_config_paths() {
        Some(path) => read_config_file(&path)?,
        None => {
            tracing::debug!("No config file found; using defaults");
            AnalyticsConfig::default()
        }
    };

    let config = apply_env_overrides(base)?;
    config.validate()?;
    Ok(config)
}

/// Defaults overlaid with `AGNOST_*` environment variables.
///
/// # Errors
/// Returns `AgnostError::Config` if a variable has an invalid value or the
/// result fails validation.
pub fn load_from_env() -> Result<AnalyticsConfig> {
    let config = apply_env_overrides(AnalyticsConfig::default())?;
    config.validate()?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from a JSON or TOML file. Missing keys keep their
/// defaults.
///
/// # Errors
/// Returns `AgnostError::Config` if the file is missing, malformed, or the
/// result fails validation.
pub fn load_from_file(path: &Path) -> Result<AnalyticsConfig> {
    let config = read_config_file(path)?;
    config.validate()?;
    Ok(config)
}

/// Organization id from `AGNOST_ORG_ID`.
///
/// # Errors
/// Returns `AgnostError::Config` if the variable is missing or blank.
pub fn load_org_id() -> Result<String> {
    let org_id = env_var("AGNOST_ORG_ID")?;
    let org_id = org_id.trim();
    if org_id.is_empty() {
        return Err(AgnostError::Config("AGNOST_ORG_ID is empty".into()));
    }
    Ok(org_id.to_string())
}

/// Overlay every `AGNOST_*` variable that is set onto `config`.
///
/// # Errors
/// Returns `AgnostError::Config` naming the first variable that fails to
/// parse.
pub fn apply_env_overrides(mut config: AnalyticsConfig) -> Result<AnalyticsConfig> {
    if let Some(endpoint) = env_opt("AGNOST_ENDPOINT") {
        config.endpoint = endpoint;
    }
    if let Some(value) = env_bool("AGNOST_DISABLE_INPUT") {
        config.disable_input = value;
    }
    if let Some(value) = env_bool("AGNOST_DISABLE_OUTPUT") {
        config.disable_output = value;
    }
    if let Some(value) = env_bool("AGNOST_ENABLE_REQUEST_QUEUING") {
        config.enable_request_queuing = value;
    }
    if let Some(mode) = env_parse::<DeliveryMode>("AGNOST_DELIVERY_MODE")? {
        config.delivery_mode = mode;
    }
    if let Some(size) = env_parse::<usize>("AGNOST_BATCH_SIZE")? {
        config.batch_size = size;
    }
    if let Some(retries) = env_parse::<u32>("AGNOST_MAX_RETRIES")? {
        config.max_retries = retries;
    }
    if let Some(ms) = env_parse::<u64>("AGNOST_RETRY_DELAY_MS")? {
        config.retry_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = env_parse::<u64>("AGNOST_REQUEST_TIMEOUT_MS")? {
        config.request_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = env_parse::<u64>("AGNOST_FLUSH_INTERVAL_MS")? {
        config.flush_interval = Duration::from_millis(ms);
    }
    if let Some(capacity) = env_parse::<usize>("AGNOST_QUEUE_CAPACITY")? {
        config.queue_capacity = capacity;
    }
    if let Some(level) = env_opt("AGNOST_LOG_LEVEL") {
        config.log_level = LogLevel::parse_lenient(&level);
    }
    Ok(config)
}

/// Probe the working directory for `agnost.json` or `agnost.toml`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    [cwd.join("agnost.json"), cwd.join("agnost.toml")].into_iter().find(|path| path.exists())
}

fn read_config_file(path: &Path) -> Result<AnalyticsConfig> {
    if !path.exists() {
        return Err(AgnostError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AgnostError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Parse configuration by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<AnalyticsConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => Ok(toml::from_str(contents).map_err(InfraError::from)?),
        "json" => Ok(serde_json::from_str(contents).map_err(InfraError::from)?),
        _ => Err(AgnostError::Config(format!("Unsupported config format: {extension}"))),
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| AgnostError::Config(format!("Missing required environment variable: {key}")))
}

/// Set and non-blank variable.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`
/// (case-insensitive). Anything else counts as false.
fn env_bool(key: &str) -> Option<bool> {
    env_opt(key).map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| AgnostError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}
