//! Client configuration

use std::fmt;
use std::time::Duration;

use crate::session::Credentials;

/// Default server address
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide settings handed to the client once at startup
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub default_player: Option<String>,
    pub default_password: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, player: impl Into<String>, password: impl Into<String>) -> Self {
        self.default_player = Some(player.into());
        self.default_password = Some(password.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Default credentials, when both halves are configured
    pub fn default_credentials(&self) -> Option<Credentials> {
        match (&self.default_player, &self.default_password) {
            (Some(player), Some(password)) if !player.is_empty() && !password.is_empty() => {
                Some(Credentials::new(player.clone(), password.clone()))
            }
            _ => None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_player: None,
            default_password: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("default_player", &self.default_player)
            .field("default_password", &self.default_password.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
