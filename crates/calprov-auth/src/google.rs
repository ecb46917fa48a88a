//! Google OAuth2 provider for Calendar access.

use calprov_core::{AuthError, ConfigError, OAuthSettings};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl, Scope, TokenUrl,
};
use serde::{Deserialize, Serialize};

use crate::client_secret::OAuthClientConfig;
use crate::oauth::{CallbackServer, OAuth2Config, TokenProvider};
use crate::storage::Credential;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

impl GoogleTokenResponse {
    /// Google usually omits the refresh token on refresh; keep the previous one then.
    fn into_credential(self, previous_refresh_token: Option<&str>) -> Credential {
        Credential {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh_token.map(str::to_string)),
            expires_at: chrono::Utc::now().timestamp() + self.expires_in as i64,
            scopes: self.scope.split_whitespace().map(str::to_string).collect(),
        }
    }
}

/// Consent URL plus the secrets needed to finish the flow.
#[derive(Debug)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub pkce_verifier: String,
}

pub struct GoogleOAuth2Provider {
    config: OAuth2Config,
    http: reqwest::Client,
}

impl GoogleOAuth2Provider {
    pub fn new(config: OAuth2Config) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Combine the downloaded client file with the configured port and scopes.
    pub fn from_client_config(client: OAuthClientConfig, settings: &OAuthSettings) -> Self {
        Self::new(OAuth2Config {
            client_id: client.client_id,
            client_secret: client.client_secret,
            auth_url: client.auth_uri,
            token_url: client.token_uri,
            redirect_port: settings.redirect_port,
            scopes: settings.scopes.clone(),
        })
    }

    /// Generate the consent URL for the given redirect.
    ///
    /// Requests offline access so the response carries a refresh token.
    pub fn authorization_url(&self, redirect_uri: &str) -> Result<AuthorizationRequest, AuthError> {
        let config = &self.config;

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(config.auth_url.clone()).map_err(|e| invalid("auth_uri", e))?,
            Some(TokenUrl::new(config.token_url.clone()).map_err(|e| invalid("token_uri", e))?),
        )
        .set_redirect_uri(
            RedirectUrl::new(redirect_uri.to_string()).map_err(|e| invalid("redirect_uri", e))?,
        );

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client.authorize_url(CsrfToken::new_random);
        for scope in &config.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (url, csrf_token) = auth_request
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        Ok(AuthorizationRequest {
            url: url.to_string(),
            state: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        })
    }

    /// Exchange authorization code for tokens.
    #[tracing::instrument(skip(self, code, pkce_verifier), level = "info")]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        pkce_verifier: &str,
    ) -> Result<GoogleTokenResponse, AuthError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("code_verifier", pkce_verifier),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| AuthError::OAuthFailed(format!("failed to send token request: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuthFailed(format!(
                "token exchange failed: {}",
                error_text
            )));
        }

        response
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| AuthError::OAuthFailed(format!("failed to parse token response: {}", e)))
    }

    /// Refresh an expired access token.
    #[tracing::instrument(skip(self, refresh_token), level = "info")]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<GoogleTokenResponse, AuthError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(format!("failed to send refresh request: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed(error_text));
        }

        response
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| AuthError::RefreshFailed(format!("failed to parse refresh response: {}", e)))
    }
}

fn invalid(field: &str, err: impl std::fmt::Display) -> AuthError {
    AuthError::Config(ConfigError::Invalid(format!("{}: {}", field, err)))
}

impl TokenProvider for GoogleOAuth2Provider {
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::RefreshFailed("no refresh token".to_string()))?;

        let response = self.refresh_token(refresh_token).await?;
        Ok(response.into_credential(Some(refresh_token)))
    }

    async fn authorize(&self) -> Result<Credential, AuthError> {
        let server = CallbackServer::bind(self.config.redirect_port)?;
        let redirect_uri = server.redirect_uri();
        let request = self.authorization_url(&redirect_uri)?;

        tracing::info!("Opening browser for OAuth2 authorization...");
        if let Err(e) = webbrowser::open(&request.url) {
            tracing::warn!("Failed to open browser ({}), visit this URL: {}", e, request.url);
        }

        let code = server.wait().await?.into_code(&request.state)?;
        let response = self
            .exchange_code(&code, &redirect_uri, &request.pkce_verifier)
            .await?;

        tracing::info!("OAuth2 flow completed");
        Ok(response.into_credential(None))
    }
}
