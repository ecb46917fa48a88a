//! Credential lifecycle for the Google Calendar API.
//!
//! [`CredentialManager`] loads a stored token, refreshes or re-authorizes it
//! through a [`TokenProvider`], and persists the result.

pub mod client_secret;
pub mod google;
pub mod manager;
pub mod oauth;
pub mod storage;

pub use client_secret::OAuthClientConfig;
pub use google::{AuthorizationRequest, GoogleOAuth2Provider, GoogleTokenResponse};
pub use manager::CredentialManager;
pub use oauth::{CallbackParams, CallbackServer, OAuth2Config, TokenProvider};
pub use storage::{Credential, CredentialStore};
