use std::path::Path;

use calprov_core::{AuthError, OAuthSettings};

use crate::client_secret::OAuthClientConfig;
use crate::google::GoogleOAuth2Provider;
use crate::oauth::TokenProvider;
use crate::storage::{Credential, CredentialStore};

/// Holds a usable credential for the lifetime of a run.
#[derive(Debug)]
pub struct CredentialManager {
    credential: Credential,
    store: Option<CredentialStore>,
}

impl CredentialManager {
    /// Load, refresh or authorize until a valid credential is available.
    ///
    /// A stored credential that is still valid is used as is. An expired one
    /// with a refresh token is refreshed; anything else goes through the
    /// interactive flow. The result is written back to `storage_path` only
    /// when it changed.
    pub async fn obtain<P: TokenProvider>(
        provider: &P,
        storage_path: Option<&Path>,
    ) -> Result<Self, AuthError> {
        let store = storage_path.map(CredentialStore::new);
        let stored = match &store {
            Some(store) => store.load()?,
            None => None,
        };

        let (credential, changed) = match stored {
            Some(credential) if credential.is_valid() => {
                tracing::debug!("Stored credentials are valid");
                (credential, false)
            }
            Some(credential) if credential.is_expired() && credential.refresh_token.is_some() => {
                tracing::info!("Access token expired, refreshing");
                (provider.refresh(&credential).await?, true)
            }
            _ => {
                tracing::info!("No usable credentials, starting authorization");
                (provider.authorize().await?, true)
            }
        };

        if changed {
            if let Some(store) = &store {
                store.save(&credential)?;
            }
        }

        Ok(Self { credential, store })
    }

    /// Build the Google provider from `settings` and obtain credentials with it.
    ///
    /// A missing client secret file is returned as [`AuthError::Config`].
    pub async fn for_google(settings: &OAuthSettings) -> Result<Self, AuthError> {
        let client = OAuthClientConfig::from_file(&settings.client_secret_path)?;
        let provider = GoogleOAuth2Provider::from_client_config(client, settings);
        Self::obtain(&provider, settings.token_path.as_deref()).await
    }

    pub fn credentials(&self) -> &Credential {
        &self.credential
    }

    pub fn access_token(&self) -> &str {
        &self.credential.access_token
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.store.as_ref().map(CredentialStore::path)
    }
}
