//! Logging infrastructure for the nodeadm library.
//!
//! Library code logs through the `log` facade. This module provides the
//! stderr backend for it, with a coarse verbosity level chosen from CLI
//! flags or the `NODEADM_LOG_MODE` environment variable.

use std::env;
use std::fmt;

use log::{LevelFilter, Metadata, Record};

/// Environment variable consulted when no CLI flag sets the level.
pub const LOG_MODE_ENV: &str = "NODEADM_LOG_MODE";

/// Logging level for controlling output verbosity.
///
/// Log levels are ordered from least verbose (Quiet) to most verbose (Verbose).
///
/// # Examples
///
/// ```
/// use nodeadm::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Only errors.
    Quiet,
    /// Errors, warnings and progress messages.
    Normal,
    /// Everything, including debug output.
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl LogLevel {
    /// Parses a log level from a string.
    ///
    /// Recognizes: "quiet", "normal", "verbose" (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodeadm::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("quiet").unwrap(), LogLevel::Quiet);
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("invalid").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("invalid log level: {s}")),
        }
    }

    /// The `log` crate filter this level admits.
    #[must_use]
    pub const fn filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::Error,
            Self::Normal => LevelFilter::Info,
            Self::Verbose => LevelFilter::Debug,
        }
    }
}

/// A stderr logger that backs the `log` facade.
///
/// # Examples
///
/// ```
/// use nodeadm::{Logger, LogLevel};
///
/// let logger = Logger::new(LogLevel::Normal);
/// assert_eq!(logger.level(), LogLevel::Normal);
/// ```
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// Creates a new logger with the specified log level.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Returns the current log level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Installs this logger as the global `log` backend.
    ///
    /// Only the first installation in a process takes effect; later calls
    /// still adjust the maximum level.
    pub fn install(self) {
        let filter = self.level.filter();
        if log::set_boxed_logger(Box::new(self)).is_err() {
            log::debug!("logger already installed, keeping existing backend");
        }
        log::set_max_level(filter);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Normal)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level.filter()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if self.level >= LogLevel::Verbose {
            eprintln!(
                "{} [{}] {}",
                record.level(),
                record.target(),
                record.args()
            );
        } else {
            eprintln!("{}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Resolves the log level from CLI flags and the environment.
///
/// The priority order is:
/// 1. CLI flags (verbose/quiet)
/// 2. `NODEADM_LOG_MODE` environment variable
/// 3. Default (Normal)
///
/// If both `verbose` and `quiet` are true, `verbose` takes precedence.
#[must_use]
pub fn resolve_level(verbose: bool, quiet: bool) -> LogLevel {
    if verbose {
        return LogLevel::Verbose;
    }
    if quiet {
        return LogLevel::Quiet;
    }

    if let Ok(env_value) = env::var(LOG_MODE_ENV) {
        if let Ok(level) = LogLevel::parse(&env_value) {
            return level;
        }
    }

    LogLevel::Normal
}

/// Initializes and installs the global logger.
///
/// # Examples
///
/// ```
/// use nodeadm::{init_logger, LogLevel};
///
/// let level = init_logger(true, false);
/// assert_eq!(level, LogLevel::Verbose);
/// ```
pub fn init_logger(verbose: bool, quiet: bool) -> LogLevel {
    let level = resolve_level(verbose, quiet);
    Logger::new(level).install();
    level
}
