use calprov_core::AuthError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// OAuth2 credential for the calendar API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Access token for API requests
    pub access_token: String,

    /// Optional refresh token for token renewal
    pub refresh_token: Option<String>,

    /// Token expiration timestamp (Unix timestamp)
    pub expires_at: i64,

    /// Scopes granted to this token
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at
    }

    /// A credential is usable when it carries a token that has not expired.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }
}

/// File-backed credential storage.
///
/// The file holds a single JSON credential and is overwritten on every save.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored credential, or `None` if the file does not exist yet.
    pub fn load(&self) -> Result<Option<Credential>, AuthError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).map_err(|e| {
            AuthError::StorageError(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let credential: Credential = serde_json::from_str(&json).map_err(|e| {
            AuthError::StorageError(format!("failed to parse {}: {}", self.path.display(), e))
        })?;

        tracing::info!("Loaded credentials from {}", self.path.display());
        Ok(Some(credential))
    }

    /// Persist the credential, replacing any previous content.
    pub fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    AuthError::StorageError(format!(
                        "failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(credential)
            .map_err(|e| AuthError::StorageError(format!("failed to serialize: {}", e)))?;

        fs::write(&self.path, json).map_err(|e| {
            AuthError::StorageError(format!("failed to write {}: {}", self.path.display(), e))
        })?;

        // File contains OAuth tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                AuthError::StorageError(format!(
                    "failed to set permissions on {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        }

        tracing::info!("Saved credentials to {}", self.path.display());
        Ok(())
    }
}
