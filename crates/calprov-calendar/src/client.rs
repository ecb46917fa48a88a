//! Authenticated HTTP session for the Google Calendar API.

use std::time::Duration;

use calprov_core::ApiSettings;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CalendarError;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Shared by the calendar and event clients; cloning reuses the connection pool.
#[derive(Debug, Clone)]
pub struct ApiSession {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl ApiSession {
    pub fn new(access_token: &str) -> Self {
        Self::new_with_base_url(access_token, CALENDAR_API_BASE)
    }

    pub fn new_with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(access_token: &str, settings: &ApiSettings) -> Result<Self, CalendarError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            access_token: access_token.to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join percent-encoded path segments onto the base URL.
    pub(crate) fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, CalendarError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", self.auth_header())
            .query(query)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, CalendarError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", self.auth_header())
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, CalendarError> {
        let response = self
            .client
            .put(url)
            .header("Authorization", self.auth_header())
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub(crate) async fn delete(&self, url: &str) -> Result<(), CalendarError> {
        let response = self
            .client
            .delete(url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        // Delete returns 204 No Content on success
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for(response).await)
        }
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CalendarError> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| CalendarError::Decode(e.to_string()))
        } else {
            Err(Self::error_for(response).await)
        }
    }

    async fn error_for(response: reqwest::Response) -> CalendarError {
        let status = response.status().as_u16();

        match status {
            401 => CalendarError::TokenExpired,
            403 => CalendarError::AuthRequired,
            404 => {
                let path = response.url().path().to_string();
                CalendarError::NotFound(path)
            }
            409 => CalendarError::Conflict,
            429 => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60);
                CalendarError::RateLimited(retry_after)
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                CalendarError::Api { status, message }
            }
        }
    }
}
