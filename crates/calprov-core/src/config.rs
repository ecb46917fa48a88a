use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Default location of the settings file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "calprov.toml";

/// Environment variables with this prefix override file settings,
/// e.g. `CALPROV__API__BASE_URL`.
pub const ENV_PREFIX: &str = "CALPROV";

const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line summary of all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth client and credential storage settings
    pub oauth: OAuthSettings,

    /// Remote calendar API settings
    pub api: ApiSettings,

    /// Log output settings
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    /// Google `client_secret.json` downloaded from the cloud console
    pub client_secret_path: PathBuf,

    /// Where the obtained credential is persisted. An empty path keeps it in memory only.
    #[serde(deserialize_with = "optional_path")]
    pub token_path: Option<PathBuf>,

    /// Loopback port for the authorization redirect
    pub redirect_port: u16,

    /// Scopes requested during interactive authorization
    pub scopes: Vec<String>,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_secret_path: PathBuf::from(".env/client_secret.json"),
            token_path: Some(PathBuf::from(".env/creds.json")),
            redirect_port: 8000,
            scopes: vec![CALENDAR_SCOPE.to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the calendar REST API
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log file written next to console output. An empty path disables file logging.
    #[serde(deserialize_with = "optional_path")]
    pub file: Option<PathBuf>,

    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

/// Treat `""` as unset so a file or environment value can switch a path off.
fn optional_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let path = Option::<PathBuf>::deserialize(deserializer)?;
    Ok(path.filter(|p| !p.as_os_str().is_empty()))
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("app.log")),
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and `CALPROV__*` environment variables.
    ///
    /// An explicitly given `path` must exist. Without one, `calprov.toml` in the
    /// working directory is used if present and defaults apply otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (file, required) = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::not_found(path));
                }
                (path.to_path_buf(), true)
            }
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        config::Config::builder()
            .add_source(config::File::from(file.as_path()).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(ConfigError::from)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult), ConfigError> {
        let config = Self::load(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.api.base_url, "api.base_url", &mut result);

        if self.api.timeout_secs == 0 {
            result.add_error("api.timeout_secs", "Timeout must be greater than 0");
        }

        if self.oauth.redirect_port == 0 {
            result.add_error("oauth.redirect_port", "Port cannot be 0");
        }

        if self.oauth.scopes.is_empty() {
            result.add_error("oauth.scopes", "At least one scope is required");
        } else if !self.oauth.scopes.iter().any(|s| s == CALENDAR_SCOPE) {
            result.add_warning(
                "oauth.scopes",
                "Full calendar scope not requested - write operations may be rejected",
            );
        }

        if self.oauth.token_path.is_none() {
            result.add_warning(
                "oauth.token_path",
                "No token file configured - sign-in will be required on every run",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::io::Write;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_defaults_match_script_layout() {
        let config = Config::default();
        assert_eq!(
            config.oauth.client_secret_path,
            PathBuf::from(".env/client_secret.json")
        );
        assert_eq!(config.oauth.token_path, Some(PathBuf::from(".env/creds.json")));
        assert_eq!(config.oauth.redirect_port, 8000);
        assert_eq!(config.logging.file, Some(PathBuf::from("app.log")));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.api.base_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.api.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "api.base_url"));
    }

    #[test]
    fn test_missing_token_path_is_warning() {
        let mut config = Config::default();
        config.oauth.token_path = None;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "oauth.token_path"));
    }

    #[test]
    fn test_empty_scopes_is_error() {
        let mut config = Config::default();
        config.oauth.scopes.clear();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.error_summary().contains("oauth.scopes"));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/calprov.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[api]\ntimeout_secs = 5\n\n[logging]\nlevel = \"debug\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.base_url, "https://www.googleapis.com/calendar/v3");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.oauth.redirect_port, 8000);
    }

    #[test]
    fn test_load_empty_paths_disable_storage_and_file_log() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[oauth]\ntoken_path = \"\"\n\n[logging]\nfile = \"\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.oauth.token_path, None);
        assert_eq!(config.logging.file, None);
        assert!(config
            .validate()
            .warnings
            .iter()
            .any(|w| w.field == "oauth.token_path"));
    }

    #[test]
    fn test_env_overrides_file_value() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[oauth]\nclient_secret_path = \"from-file.json\"").unwrap();

        std::env::set_var("CALPROV__OAUTH__CLIENT_SECRET_PATH", "from-env.json");
        let result = Config::load(Some(file.path()));
        std::env::remove_var("CALPROV__OAUTH__CLIENT_SECRET_PATH");

        let config = result.unwrap();
        assert_eq!(config.oauth.client_secret_path, PathBuf::from("from-env.json"));
        assert_eq!(config.oauth.redirect_port, 8000);
    }

    #[test]
    fn test_load_validated_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[oauth]\nredirect_port = 0").unwrap();

        let result = Config::load_validated(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Invalid(ref msg)) if msg.contains("redirect_port")));
    }
}
