//! Error types for the provision crate.

use std::time::Duration;

use thiserror::Error;

/// Failures shared by the provisioner, the stores and the command executor.
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced application, unit or image does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Caller lacks the relationship required for the action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An external command exited nonzero or could not be spawned.
    #[error("Command '{command}' failed: {stderr}")]
    Execution { command: String, stderr: String },

    /// Malformed or unexpected output from a command or API.
    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Missing configuration key '{0}'")]
    ConfigurationMissing(String),

    /// A bounded wait or a command ran past its deadline.
    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// NotFound and Forbidden are reported with their own status.
    pub fn is_user_visible_status(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Forbidden(_))
    }

    /// HTTP-style status for callers that surface errors to users.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Forbidden(_) => 403,
            _ => 500,
        }
    }
}

/// Convenience result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
