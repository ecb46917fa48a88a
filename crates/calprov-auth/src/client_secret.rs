//! OAuth client configuration as downloaded from the Google Cloud console.

use std::path::Path;

use calprov_core::ConfigError;
use serde::Deserialize;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Client identity and endpoints used by the interactive flow and token refresh.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// `client_secret.json` wraps the client under `installed` (desktop apps) or
/// `web` (web apps).
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<OAuthClientConfig>,
    web: Option<OAuthClientConfig>,
}

impl OAuthClientConfig {
    /// Read the client file. A missing file is fatal for the caller.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::error!("OAuth credentials file not found: {}", path.display());
            return Err(ConfigError::not_found(path));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: ClientSecretFile = serde_json::from_str(json)
            .map_err(|e| ConfigError::ParseError(format!("client secret: {}", e)))?;

        let client = file
            .installed
            .or(file.web)
            .ok_or_else(|| ConfigError::MissingSetting("installed or web client".to_string()))?;

        if client.client_id.is_empty() {
            return Err(ConfigError::MissingSetting("client_id".to_string()));
        }

        Ok(client)
    }
}
