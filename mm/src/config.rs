//! moor-mcp configuration types and loading

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result, eyre};
use moorrest::ClientConfig;
use serde::Deserialize;

/// Environment variables that override file settings
pub const ENV_BASE_URL: &str = "MOOR_BASE_URL";
pub const ENV_PLAYER: &str = "MOOR_PLAYER";
pub const ENV_PASSWORD: &str = "MOOR_PASSWORD";
pub const ENV_TIMEOUT_MS: &str = "MOOR_TIMEOUT_MS";

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// mooR server connection
    pub moor: MoorConfig,

    /// Log level used when `--log-level` is not given
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.moor.timeout_ms == 0 {
            return Err(eyre!(
                "timeout-ms must be greater than 0 (set in the config file or {})",
                ENV_TIMEOUT_MS
            ));
        }
        Ok(())
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .moor-mcp.yml
        let local_config = PathBuf::from(".moor-mcp.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/moor-mcp/moor-mcp.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("moor-mcp").join("moor-mcp.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Overlay `MOOR_*` variables; `lookup` returns a variable's value
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.moor.base_url = url;
        }
        if let Some(player) = lookup(ENV_PLAYER).filter(|v| !v.is_empty()) {
            self.moor.player = Some(player);
        }
        if let Some(password) = lookup(ENV_PASSWORD).filter(|v| !v.is_empty()) {
            self.moor.password = Some(password);
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_MS).filter(|v| !v.is_empty()) {
            self.moor.timeout_ms = timeout
                .trim()
                .parse()
                .context(format!("{} must be a number of milliseconds", ENV_TIMEOUT_MS))?;
        }
        Ok(())
    }
}

/// mooR server connection settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MoorConfig {
    /// REST API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Default player for automatic login
    pub player: Option<String>,

    /// Default password for automatic login
    pub password: Option<String>,

    /// Per-request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl MoorConfig {
    /// Settings handed to the REST client
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            default_player: self.player.clone(),
            default_password: self.password.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

impl Default for MoorConfig {
    fn default() -> Self {
        Self {
            base_url: moorrest::config::DEFAULT_BASE_URL.to_string(),
            player: None,
            password: None,
            timeout_ms: 30_000,
        }
    }
}

impl fmt::Debug for MoorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoorConfig")
            .field("base_url", &self.base_url)
            .field("player", &self.player)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
