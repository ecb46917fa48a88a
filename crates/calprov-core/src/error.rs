//! Shared error types for calprov.
//!
//! Configuration and authentication failures are fatal for a provisioning run,
//! so both carry a `user_message()` suitable for the final log line. Remote
//! request failures live next to the API client in `calprov-calendar`.

use std::path::Path;

use thiserror::Error;

/// Configuration errors (settings file, OAuth client file).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    /// Shorthand for a missing file at `path`.
    pub fn not_found(path: &Path) -> Self {
        ConfigError::NotFound(path.display().to_string())
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "A required file is missing. Check the configured paths.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingSetting(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}

/// Authentication errors (OAuth flow, token refresh, credential storage).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("OAuth client configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("OAuth flow cancelled by user")]
    OAuthCancelled,

    #[error("OAuth state mismatch on callback")]
    StateMismatch,

    #[error("Credential storage error: {0}")]
    StorageError(String),

    #[error("Port {0} already in use for OAuth callback")]
    PortInUse(u16),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::Config(e) => e.user_message(),
            AuthError::RefreshFailed(_) => {
                "Could not renew your session. Delete the token file and sign in again."
            }
            AuthError::OAuthFailed(_) => "Sign-in failed. Please try again.",
            AuthError::OAuthCancelled => "Sign-in was cancelled.",
            AuthError::StateMismatch => "Sign-in response did not match the request. Try again.",
            AuthError::StorageError(_) => "Failed to read or save credentials.",
            AuthError::PortInUse(_) => "Sign-in port is busy. Close other apps and try again.",
        }
    }
}
