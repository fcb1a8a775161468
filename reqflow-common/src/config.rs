//! Service configuration resolution
//!
//! Values resolve in priority order:
//! 1. Environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Default listen port
pub const DEFAULT_PORT: u16 = 8000;
/// Default inference gateway base URL
pub const DEFAULT_GATEWAY_URL: &str = "https://space.ai-builders.com/backend";
/// Default generative model identifier
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
/// Default maximum gateway attempts per round
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default initial backoff delay in seconds (doubles per retry)
pub const DEFAULT_INITIAL_BACKOFF_SECS: u64 = 2;

/// Optional overrides loaded from the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub gateway_url: Option<String>,
    pub gateway_token: Option<String>,
    pub gateway_model: Option<String>,
    pub max_retries: Option<u32>,
    pub initial_backoff_secs: Option<u64>,
    pub static_dir: Option<PathBuf>,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listen port
    pub port: u16,
    /// Inference gateway base URL
    pub gateway_url: String,
    /// Bearer token for the gateway; required only to construct the live client
    pub gateway_token: Option<String>,
    /// Model identifier sent with each generation request
    pub gateway_model: String,
    /// Maximum gateway attempts per round (first try included)
    pub max_retries: u32,
    /// Initial backoff delay before the first retry
    pub initial_backoff: Duration,
    /// Directory of static frontend assets, if served
    pub static_dir: Option<PathBuf>,
}

impl ServiceConfig {
    /// Resolve configuration from the process environment and the platform
    /// config file. Never fails; unparseable values fall back with a warning.
    pub fn resolve() -> Self {
        let toml_config = match load_toml_config() {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                TomlConfig::default()
            }
        };

        Self::resolve_from(toml_config, |name| std::env::var(name).ok())
    }

    /// Resolution core, parameterized over the environment lookup so tests
    /// can drive it without mutating process state.
    pub fn resolve_from(
        toml_config: TomlConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let port = parse_env(&env, "REQFLOW_PORT")
            .or(toml_config.port)
            .unwrap_or(DEFAULT_PORT);

        let gateway_url = env_value(&env, "REQFLOW_GATEWAY_URL")
            .or(toml_config.gateway_url)
            .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());

        // Token may arrive from both sources; environment wins, as with the
        // other values, but flag the ambiguity.
        let env_token = env_value(&env, "AI_BUILDER_TOKEN");
        if env_token.is_some() && toml_config.gateway_token.is_some() {
            warn!("Gateway token set in both environment and config file; using environment");
        }
        let gateway_token = env_token.or(toml_config.gateway_token);

        let gateway_model = env_value(&env, "REQFLOW_MODEL")
            .or(toml_config.gateway_model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_retries = parse_env(&env, "REQFLOW_MAX_RETRIES")
            .or(toml_config.max_retries)
            .unwrap_or(DEFAULT_MAX_RETRIES)
            .max(1);

        let initial_backoff_secs = parse_env(&env, "REQFLOW_INITIAL_BACKOFF_SECS")
            .or(toml_config.initial_backoff_secs)
            .unwrap_or(DEFAULT_INITIAL_BACKOFF_SECS);

        let static_dir = env_value(&env, "REQFLOW_STATIC_DIR")
            .map(PathBuf::from)
            .or(toml_config.static_dir);

        Self {
            port,
            gateway_url,
            gateway_token,
            gateway_model,
            max_retries,
            initial_backoff: Duration::from_secs(initial_backoff_secs),
            static_dir,
        }
    }
}

/// Non-empty environment value
fn env_value(env: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an environment value, warning (and falling through) when invalid
fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = env_value(env, name)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable {}: {:?}", name, raw);
            None
        }
    }
}

/// Load the TOML config file from the platform config directory.
/// A missing file is not an error; an unreadable or invalid one is.
fn load_toml_config() -> Result<TomlConfig> {
    let path = match config_file_path() {
        Ok(path) => path,
        Err(_) => return Ok(TomlConfig::default()),
    };
    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Locate the config file for the platform
fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/reqflow/config.toml first, then /etc/reqflow/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("reqflow").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/reqflow/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("reqflow").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}
