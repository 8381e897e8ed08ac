//! Client configuration.

use std::time::Duration;

use crate::SessionError;

/// Where the match server lives, and how long the "room not found"
/// recovery waits before returning to the multiplayer menu.
///
/// Start from `ClientConfig::default()` and override what you need:
///
/// ```rust
/// use std::time::Duration;
/// use dropline_session::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_server_url("ws://games.example.com/ws")
///     .with_recovery_delay(Duration::from_secs(1));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint of the match server.
    ///
    /// Default: `ws://localhost:8000/ws`.
    pub server_url: String,

    /// Delay between a `Room not found` error and the automatic move
    /// back to the multiplayer menu.
    ///
    /// Default: 2 seconds.
    pub recovery_delay: Duration,
}

impl ClientConfig {
    /// Default match server endpoint.
    pub const DEFAULT_SERVER_URL: &'static str = "ws://localhost:8000/ws";

    /// Default recovery delay.
    pub const DEFAULT_RECOVERY_DELAY: Duration = Duration::from_secs(2);

    /// Sets the server URL.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Sets the recovery delay.
    #[must_use]
    pub fn with_recovery_delay(mut self, delay: Duration) -> Self {
        self.recovery_delay = delay;
        self
    }

    /// Checks that the URL is a WebSocket URL with a host part.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidConfig`] describing the problem.
    pub fn validate(&self) -> Result<(), SessionError> {
        let url = self.server_url.trim();
        if url.is_empty() {
            return Err(SessionError::InvalidConfig("server URL is empty".into()));
        }
        let rest = url
            .strip_prefix("ws://")
            .or_else(|| url.strip_prefix("wss://"))
            .ok_or_else(|| {
                SessionError::InvalidConfig(format!(
                    "server URL must start with ws:// or wss://, got {url}"
                ))
            })?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(SessionError::InvalidConfig(format!(
                "server URL has no host: {url}"
            )));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: Self::DEFAULT_SERVER_URL.to_string(),
            recovery_delay: Self::DEFAULT_RECOVERY_DELAY,
        }
    }
}
