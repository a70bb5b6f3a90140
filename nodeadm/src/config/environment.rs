//! Environment variable overrides for agent settings.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::settings::Settings;
use crate::error::{Error, Result};

/// Comma-separated config source URIs.
pub const CONFIG_SOURCES_ENV: &str = "NODEADM_CONFIG_SOURCES";

/// Cache file location.
pub const CONFIG_CACHE_ENV: &str = "NODEADM_CONFIG_CACHE";

/// Metadata service endpoint, shared with the AWS SDKs.
pub const IMDS_ENDPOINT_ENV: &str = "AWS_EC2_METADATA_SERVICE_ENDPOINT";

/// Attempts per metadata request.
pub const IMDS_MAX_ATTEMPTS_ENV: &str = "NODEADM_IMDS_MAX_ATTEMPTS";

/// Per-request timeout for the metadata service, in seconds.
pub const IMDS_TIMEOUT_ENV: &str = "NODEADM_IMDS_TIMEOUT_SECONDS";

/// Applies environment variable overrides to [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use nodeadm::config::{EnvironmentSettings, Settings};
///
/// let mut settings = Settings::default();
/// EnvironmentSettings::apply_overrides(&mut settings).unwrap();
/// ```
pub struct EnvironmentSettings;

impl EnvironmentSettings {
    /// Apply environment variable overrides to settings.
    ///
    /// Unset and empty variables leave the setting alone.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the variable if a value is invalid.
    pub fn apply_overrides(settings: &mut Settings) -> Result<()> {
        if let Some(sources) = var(CONFIG_SOURCES_ENV) {
            settings.config_sources = Self::parse_sources(&sources)?;
        }

        if let Some(path) = var(CONFIG_CACHE_ENV) {
            settings.config_cache = PathBuf::from(path);
        }

        if let Some(endpoint) = var(IMDS_ENDPOINT_ENV) {
            settings.imds.endpoint = endpoint;
        }

        if let Some(attempts) = var(IMDS_MAX_ATTEMPTS_ENV) {
            settings.imds.max_attempts = match attempts.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(Error::Validation {
                        field: IMDS_MAX_ATTEMPTS_ENV.into(),
                        message: format!("must be a positive integer, got {attempts:?}"),
                    })
                }
            };
        }

        if let Some(seconds) = var(IMDS_TIMEOUT_ENV) {
            settings.imds.request_timeout = Self::parse_seconds(IMDS_TIMEOUT_ENV, &seconds)?;
        }

        Ok(())
    }

    /// Split a comma-separated source list, dropping blank entries.
    fn parse_sources(value: &str) -> Result<Vec<String>> {
        let sources: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if sources.is_empty() {
            return Err(Error::Validation {
                field: CONFIG_SOURCES_ENV.into(),
                message: "must name at least one config source".into(),
            });
        }
        Ok(sources)
    }

    fn parse_seconds(field: &str, value: &str) -> Result<Duration> {
        match value.trim().parse::<f64>() {
            Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(Duration::from_secs_f64(secs)),
            _ => Err(Error::Validation {
                field: field.into(),
                message: format!("must be a positive number of seconds, got {value:?}"),
            }),
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
