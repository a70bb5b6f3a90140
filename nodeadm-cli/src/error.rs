//! CLI-specific error types with exit codes.
//!
//! This module defines error types specific to the CLI layer,
//! wrapping library errors and providing appropriate exit codes.

use nodeadm::Error as LibError;
use std::fmt;

/// CLI-specific error type with exit code mapping.
#[derive(Debug)]
pub enum CliError {
    /// Library error (wrapped).
    Library(LibError),

    /// Invalid command-line arguments.
    InvalidArguments(String),

    /// I/O error.
    Io(std::io::Error),

    /// Agent settings from the environment are invalid.
    Settings(LibError),
}

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: Configuration failed validation
    /// - 2: No configuration found in any source
    /// - 3: A config source could not be read or decoded
    /// - 4: Invalid arguments
    /// - 5: I/O error
    /// - 6: Other library error
    /// - 7: Invalid agent settings
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Library(lib_err) => match lib_err {
                LibError::Validation { .. } => 1,
                LibError::NoConfigInChain => 2,
                LibError::Provider { .. }
                | LibError::DirectoryEntry { .. }
                | LibError::Part { .. }
                | LibError::UnsupportedScheme { .. }
                | LibError::InvalidSource { .. }
                | LibError::FileRead { .. }
                | LibError::NoConfigInFile { .. }
                | LibError::Gzip(_)
                | LibError::Mime { .. }
                | LibError::Decode { .. }
                | LibError::KindMismatch { .. }
                | LibError::MergeParse { .. }
                | LibError::Metadata { .. }
                | LibError::MetadataNotFound { .. }
                | LibError::Http(_) => 3,
                LibError::Io(_) => 5,
                _ => 6,
            },
            CliError::InvalidArguments(_) => 4,
            CliError::Io(_) => 5,
            CliError::Settings(_) => 7,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Library(e) => write!(f, "{e}"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Settings(e) => write!(f, "Invalid settings: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) | CliError::Settings(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidArguments(_) => None,
        }
    }
}

impl From<LibError> for CliError {
    fn from(e: LibError) -> Self {
        CliError::Library(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
