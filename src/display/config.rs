//! Display client configuration loaded from environment.

use std::time::Duration;
use url::Url;

use super::surface::ImageSource;

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// Origin of the distribution server (e.g. `https://hub.local:3002`).
    pub server_url: Url,
    /// Pause between reconnect attempts.
    pub reconnect_delay: Duration,
    pub log_level: String,
}

impl DisplayConfig {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, DisplayConfigError> {
        let server_url =
            std::env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());
        let reconnect_ms = match std::env::var("RECONNECT_DELAY_MS") {
            Ok(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| DisplayConfigError::InvalidReconnectDelay)?,
            Err(_) => 2000,
        };
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        Self::new(&server_url, Duration::from_millis(reconnect_ms), log_level)
    }

    pub fn new(
        server_url: &str,
        reconnect_delay: Duration,
        log_level: String,
    ) -> Result<Self, DisplayConfigError> {
        let server_url =
            Url::parse(server_url.trim()).map_err(|_| DisplayConfigError::InvalidServerUrl)?;
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(DisplayConfigError::InvalidServerUrl);
        }
        Ok(Self {
            server_url,
            reconnect_delay,
            log_level,
        })
    }

    pub fn is_secure(&self) -> bool {
        self.server_url.scheme() == "https"
    }

    /// WebSocket endpoint on the same origin (`ws://` or `wss://`).
    pub fn ws_url(&self) -> String {
        let mut url = self.server_url.clone();
        let scheme = if self.is_secure() { "wss" } else { "ws" };
        // http -> ws and https -> wss are both special schemes, so this cannot fail.
        let _ = url.set_scheme(scheme);
        url.set_path("/ws");
        url.set_query(None);
        url.to_string()
    }

    /// Images over plain http are relayed only when the display's own origin is encrypted.
    pub fn image_source(&self) -> ImageSource {
        if self.is_secure() {
            let mut relay = self.server_url.clone();
            relay.set_path("/relay");
            relay.set_query(None);
            ImageSource::relayed(relay.to_string())
        } else {
            ImageSource::direct()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayConfigError {
    #[error("Invalid SERVER_URL (expected http:// or https://)")]
    InvalidServerUrl,
    #[error("Invalid RECONNECT_DELAY_MS")]
    InvalidReconnectDelay,
}
