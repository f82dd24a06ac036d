//! Application configuration loaded from environment.

use std::net::SocketAddr;
use std::time::Duration;

/// Default relay byte ceiling (20 MiB).
pub const DEFAULT_RELAY_MAX_BYTES: u64 = 20 * 1024 * 1024;
/// Default relay upstream timeout.
pub const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 20;

/// Who may read server state without a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Require a valid bearer token on `GET /api/status`.
    pub status_requires_token: bool,
    /// Require a valid token to open a display socket (gates resync and broadcast receipt).
    pub displays_require_token: bool,
}

/// Application configuration loaded from `.env` and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g. `0.0.0.0:3001`).
    pub server_addr: SocketAddr,
    /// Public origin advertised to displays; derived from the request when unset.
    pub server_url: Option<String>,
    /// JWT signing secret.
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password: String,
    pub policy: AccessPolicy,
    /// Directory served for page bootstrapping.
    pub static_dir: String,
    pub relay_max_bytes: u64,
    pub relay_timeout: Duration,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let server_addr = std::env::var("SERVER_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3001".to_string());
        let server_addr: SocketAddr = server_addr
            .parse()
            .map_err(|_| ConfigLoadError::InvalidServerAddr)?;

        let server_url = std::env::var("SERVER_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());
        let jwt_secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "display_hub_jwt_secret_change_in_production".to_string());
        let admin_username =
            std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password =
            std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "change-me".to_string());

        let policy = AccessPolicy {
            status_requires_token: env_flag("STATUS_REQUIRES_TOKEN")?,
            displays_require_token: env_flag("DISPLAYS_REQUIRE_TOKEN")?,
        };

        let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string());
        let relay_max_bytes = env_number("RELAY_MAX_BYTES", DEFAULT_RELAY_MAX_BYTES)?;
        let relay_timeout =
            Duration::from_secs(env_number("RELAY_TIMEOUT_SECS", DEFAULT_RELAY_TIMEOUT_SECS)?);
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            server_addr,
            server_url,
            jwt_secret,
            admin_username,
            admin_password,
            policy,
            static_dir,
            relay_max_bytes,
            relay_timeout,
            log_level,
        })
    }
}

fn env_flag(name: &'static str) -> Result<bool, ConfigLoadError> {
    match std::env::var(name) {
        Err(_) => Ok(false),
        Ok(v) => parse_flag(&v).ok_or(ConfigLoadError::InvalidFlag(name)),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_number(name: &'static str, default: u64) -> Result<u64, ConfigLoadError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigLoadError::InvalidNumber(name)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Invalid SERVER_ADDR")]
    InvalidServerAddr,
    #[error("Invalid boolean in {0}")]
    InvalidFlag(&'static str),
    #[error("Invalid number in {0}")]
    InvalidNumber(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" yes "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(""), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn default_policy_is_open() {
        let policy = AccessPolicy::default();
        assert!(!policy.status_requires_token);
        assert!(!policy.displays_require_token);
    }
}
