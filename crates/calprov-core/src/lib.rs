pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    ApiSettings, Config, ConfigValidationError, LoggingSettings, OAuthSettings, ValidationResult,
};
pub use error::{AuthError, ConfigError};
pub use logging::LogGuard;
