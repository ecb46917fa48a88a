//! Calendar-specific error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Token expired")]
    TokenExpired,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid event data: {0}")]
    InvalidEventData(String),

    #[error("Conflict: resource was modified")]
    Conflict,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to share calendar {calendar_id} with {email}: {source}")]
    Share {
        calendar_id: String,
        email: String,
        #[source]
        source: Box<CalendarError>,
    },
}

impl CalendarError {
    /// User-friendly error message for the final log line.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired => "Access denied. Check the granted scopes.".to_string(),
            Self::TokenExpired => "Your session has expired. Please sign in again.".to_string(),
            Self::RateLimited(secs) => format!("Too many requests. Please wait {} seconds.", secs),
            Self::NotFound(_) => "Calendar resource not found".to_string(),
            Self::InvalidEventData(msg) => format!("Invalid event: {}", msg),
            Self::Conflict => "The resource was modified elsewhere. Please retry.".to_string(),
            Self::Api { status, .. } => format!("Calendar service error (HTTP {})", status),
            Self::Decode(_) => "Unexpected response from the calendar service".to_string(),
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Share { email, .. } => format!("Could not share the calendar with {}", email),
        }
    }

    /// Whether this error means the access token should be renewed.
    pub fn should_refresh_token(&self) -> bool {
        match self {
            Self::TokenExpired | Self::AuthRequired => true,
            Self::Share { source, .. } => source.should_refresh_token(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
