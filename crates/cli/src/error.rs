//! Error types for CLI operations.

use std::path::Path;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration rejected by the loader
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    /// A configured child could not be registered
    #[error("Failed to register child '{child}': {source}")]
    Registration {
        child: String,
        #[source]
        source: dispatcher::DispatchError,
    },

    /// Simulation did not finish in time
    #[error("Simulation timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    pub fn registration(child: impl Into<String>, source: dispatcher::DispatchError) -> Self {
        Self::Registration {
            child: child.into(),
            source,
        }
    }
}
