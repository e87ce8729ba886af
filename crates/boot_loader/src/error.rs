//! Boot loader error types

use thiserror::Error;

use crate::ImageHandle;

/// Boot loader specific error
///
/// Returned verbatim by [`try_run_kernel`](crate::try_run_kernel).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootError {
    /// No kernel image was supplied to the firmware
    #[error("no kernel image available")]
    NotFound,

    /// Kernel image could not be loaded
    #[error("failed to load kernel image: {message}")]
    LoadFailed { message: String },

    /// Kernel image was loaded but start failed or returned an error
    #[error("failed to start kernel image {image}: {message}")]
    StartFailed { image: ImageHandle, message: String },

    /// Kernel image could not be unloaded
    #[error("failed to unload kernel image {image}: {message}")]
    UnloadFailed { image: ImageHandle, message: String },
}

impl BootError {
    /// Create load error
    pub fn load(message: impl Into<String>) -> Self {
        Self::LoadFailed {
            message: message.into(),
        }
    }

    /// Create start error
    pub fn start(image: ImageHandle, message: impl Into<String>) -> Self {
        Self::StartFailed {
            image,
            message: message.into(),
        }
    }

    /// Create unload error
    pub fn unload(image: ImageHandle, message: impl Into<String>) -> Self {
        Self::UnloadFailed {
            image,
            message: message.into(),
        }
    }
}

/// Boot loader Result type
pub type Result<T> = std::result::Result<T, BootError>;
