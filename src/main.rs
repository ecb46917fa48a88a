mod provision;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use calprov_calendar::CalendarError;
use calprov_core::{AuthError, Config, ConfigError, ValidationResult};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "calprov")]
#[command(version, about = "Provision Google calendars, sharing rules and events")]
struct Cli {
    /// Settings file (TOML). Defaults to ./calprov.toml when present
    #[arg(long, env = "CALPROV_CONFIG")]
    config: Option<PathBuf>,

    /// OAuth client file downloaded from the Google Cloud console
    #[arg(long)]
    client_secret: Option<PathBuf>,

    /// Where the obtained credential is stored between runs. Empty keeps it in memory
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Log file written next to console output. Empty disables file logging
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.client_secret {
            config.oauth.client_secret_path = path.clone();
        }
        if let Some(path) = &self.token_file {
            config.oauth.token_path = non_empty(path);
        }
        if let Some(path) = &self.log_file {
            config.logging.file = non_empty(path);
        }
    }
}

fn non_empty(path: &Path) -> Option<PathBuf> {
    (!path.as_os_str().is_empty()).then(|| path.to_path_buf())
}

fn load_config(cli: &Cli) -> Result<(Config, ValidationResult)> {
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply(&mut config);

    let validation = config.validate();
    if !validation.is_valid() {
        anyhow::bail!("invalid configuration: {}", validation.error_summary());
    }

    Ok((config, validation))
}

/// Short hint for the final log line, if the failure has one.
fn user_message(err: &anyhow::Error) -> Option<String> {
    if let Some(e) = err.downcast_ref::<CalendarError>() {
        return Some(e.user_message());
    }
    if let Some(e) = err.downcast_ref::<AuthError>() {
        return Some(e.user_message().to_string());
    }
    err.downcast_ref::<ConfigError>()
        .map(|e| e.user_message().to_string())
}

/// Log the outcome of a run once. Returns whether it succeeded.
fn report(outcome: &Result<()>) -> bool {
    match outcome {
        Ok(()) => {
            tracing::info!("Provisioning run completed");
            true
        }
        Err(e) => {
            match user_message(e) {
                Some(hint) => tracing::error!(hint = %hint, "An error occurred: {:#}", e),
                None => tracing::error!("An error occurred: {:#}", e),
            }
            false
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, validation) = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("calprov: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match calprov_core::logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("calprov: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!("Loaded configuration: {:?}", config);
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }

    // A failed run exits non-zero so callers can detect it.
    if report(&provision::run(&config).await) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_cli_overrides_config_paths() {
        let cli = Cli::try_parse_from([
            "calprov",
            "--client-secret",
            "/etc/calprov/client.json",
            "--token-file",
            "/var/lib/calprov/creds.json",
            "--log-file",
            "/var/log/calprov.log",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(
            config.oauth.client_secret_path,
            PathBuf::from("/etc/calprov/client.json")
        );
        assert_eq!(
            config.oauth.token_path,
            Some(PathBuf::from("/var/lib/calprov/creds.json"))
        );
        assert_eq!(config.logging.file, Some(PathBuf::from("/var/log/calprov.log")));
    }

    #[test]
    fn test_user_message_sees_through_context() {
        let err = anyhow::Error::new(CalendarError::TokenExpired).context("failed to create calendar");
        assert!(user_message(&err).unwrap().contains("sign in"));

        let err = anyhow::anyhow!("plain failure");
        assert!(user_message(&err).is_none());
    }

    #[test]
    fn test_empty_cli_paths_disable_storage_and_file_log() {
        let cli = Cli::try_parse_from(["calprov", "--token-file", "", "--log-file", ""]).unwrap();

        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.oauth.token_path, None);
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn test_failed_run_is_reported_as_failure() {
        assert!(report(&Ok(())));

        let err = anyhow::Error::new(CalendarError::NotFound("calendars/missing".into()))
            .context("failed to select calendar");
        assert!(!report(&Err(err)));
    }
}
