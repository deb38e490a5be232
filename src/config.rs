// ABOUTME: Configuration loading and validation for the adminctl CLI.
// ABOUTME: Reads ADMINCTL_* environment variables and validates the base URL shape.

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ADMINCTL_BASE_URL must start with http:// or https://, got: {0}")]
    InvalidBaseUrl(String),
}

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub tenant: Option<String>,
}

impl CliConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - ADMINCTL_BASE_URL: admin API origin (default: http://127.0.0.1:8700)
    /// - ADMINCTL_TOKEN: bearer token to use instead of an interactive login (optional)
    /// - ADMINCTL_TENANT: tenant id sent with every request (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("ADMINCTL_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8700".to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        let token = std::env::var("ADMINCTL_TOKEN").ok().filter(|t| !t.is_empty());
        let tenant = std::env::var("ADMINCTL_TENANT").ok().filter(|t| !t.is_empty());

        Ok(Self {
            base_url,
            token,
            tenant,
        })
    }
}
