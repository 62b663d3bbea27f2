//! Error types for COPG configuration operations.

use thiserror::Error;

/// Primary error type for config operations.
#[derive(Error, Debug)]
pub enum CopgError {
    // Validation errors (raised before any mutation)
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    // Persistence errors
    #[error("Config file not found: {path}")]
    ConfigMissing { path: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    // Bridge errors
    #[error("Command bridge unavailable: {0}")]
    BridgeUnavailable(String),

    #[error("Command failed ({code}): {stderr}")]
    CommandFailed {
        command: String,
        code: String,
        stderr: String,
    },

    // Undo errors
    #[error("Nothing to undo: {0}")]
    UndoUnavailable(String),

    #[error("Another action is in progress: {0}")]
    Busy(String),

    // Settings errors
    #[error("Settings parse error: {0}")]
    SettingsParse(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl CopgError {
    /// Shorthand for a validation failure on a named form field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the offending field for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::UndoUnavailable(_)
                | Self::Busy(_)
                | Self::SettingsParse(_)
        )
    }

    /// Returns true for errors that originate from the persistence path.
    pub const fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::ConfigMissing { .. }
                | Self::Persistence(_)
                | Self::BridgeUnavailable(_)
                | Self::CommandFailed { .. }
                | Self::Io(_)
                | Self::Json(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::BridgeUnavailable(_) => {
                Some("Run on a rooted device, or use --backend file for a local config")
            }
            Self::NotFound { .. } => Some("Run: copg list"),
            Self::ConfigMissing { .. } => Some("Add a device first: copg device add --device <NAME> --model <MODEL>"),
            Self::UndoUnavailable(_) => Some("Undo is only possible right after a delete"),
            Self::Busy(_) => Some("Wait for the running action to finish"),
            Self::SettingsParse(_) => Some("Check the settings file syntax (.toml, .yaml or .yml)"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using CopgError.
pub type Result<T> = std::result::Result<T, CopgError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| CopgError::Other(format!("{}: {e}", f().into())))
    }
}
