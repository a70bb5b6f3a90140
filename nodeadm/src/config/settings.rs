//! Settings of the agent itself.
//!
//! These say where configuration comes from and how the metadata service
//! is reached. They are not part of the node configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::environment::EnvironmentSettings;
use crate::error::Result;

/// Default cache location.
pub const DEFAULT_CONFIG_CACHE: &str = "/run/eks/nodeadm/config.json";

/// Default config source.
pub const DEFAULT_CONFIG_SOURCE: &str = "imds://user-data";

/// Default metadata service endpoint.
pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254";

/// Agent settings.
///
/// # Examples
///
/// ```
/// use nodeadm::config::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.config_sources, vec!["imds://user-data"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Config source URIs, lowest precedence first.
    pub config_sources: Vec<String>,
    /// Where the resolved configuration is cached.
    pub config_cache: PathBuf,
    /// Metadata service access.
    pub imds: ImdsSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_sources: vec![DEFAULT_CONFIG_SOURCE.to_string()],
            config_cache: PathBuf::from(DEFAULT_CONFIG_CACHE),
            imds: ImdsSettings::default(),
        }
    }
}

impl Settings {
    /// Built-in defaults with environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming any malformed variable.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        EnvironmentSettings::apply_overrides(&mut settings)?;
        Ok(settings)
    }
}

/// How the metadata service is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImdsSettings {
    /// Base URL of the service.
    pub endpoint: String,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    /// Wait after the first failed attempt; doubles each retry.
    pub initial_backoff: Duration,
    /// Cap on a single wait.
    pub max_backoff: Duration,
    /// Timeout of a single request.
    pub request_timeout: Duration,
}

impl Default for ImdsSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_IMDS_ENDPOINT.to_string(),
            max_attempts: 10,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            request_timeout: Duration::from_secs(5),
        }
    }
}
