//! Layered error definitions
//!
//! Categorized by source: config / trigger / handler

use thiserror::Error;

use crate::SmiType;

/// Unified contract error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Unknown SMI sub-type name
    #[error("unknown smi type: '{0}'")]
    UnknownSmiType(String),

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure reported by a hardware trigger hook
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TriggerError {
    /// The source refused the enable/disable request
    #[error("trigger for {smi_type} refused: {message}")]
    Refused { smi_type: SmiType, message: String },

    /// The platform has no hardware behind this sub-type
    #[error("trigger for {0} is not wired on this platform")]
    NotWired(SmiType),
}

impl TriggerError {
    /// Create a refusal error
    pub fn refused(smi_type: SmiType, message: impl Into<String>) -> Self {
        Self::Refused {
            smi_type,
            message: message.into(),
        }
    }
}

/// Non-fatal failure returned by a child handler
///
/// The dispatcher logs and counts these; it never propagates them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("handler failed: {message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create a handler failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Failure description
    pub fn message(&self) -> &str {
        &self.message
    }
}
