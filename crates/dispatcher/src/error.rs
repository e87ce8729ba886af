//! Dispatcher error types

use std::fmt;

use contracts::{DispatchHandle, SmiType, TriggerError};
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Sub-type not recognised by this dispatcher instance
    #[error("invalid parameter: smi type '{0}' is not supported by this dispatcher")]
    UnsupportedType(SmiType),

    /// Handle does not name a live registration
    #[error("invalid parameter: {0} does not name a live registration")]
    UnknownHandle(DispatchHandle),

    /// Registration arena exhausted
    #[error("out of resources: all {capacity} registration slots are in use")]
    OutOfResources { capacity: usize },

    /// Hardware trigger refused to enable the source
    #[error("device error: failed to enable smi source '{smi_type}': {source}")]
    DeviceError {
        smi_type: SmiType,
        #[source]
        source: TriggerError,
    },
}

/// Coarse error taxonomy shared with firmware callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParameter,
    OutOfResources,
    DeviceError,
}

impl DispatchError {
    /// Create a device error
    pub fn device(smi_type: SmiType, source: TriggerError) -> Self {
        Self::DeviceError { smi_type, source }
    }

    /// Coarse kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedType(_) | Self::UnknownHandle(_) => ErrorKind::InvalidParameter,
            Self::OutOfResources { .. } => ErrorKind::OutOfResources,
            Self::DeviceError { .. } => ErrorKind::DeviceError,
        }
    }

    /// Firmware status code for this error
    pub fn status(&self) -> EfiStatus {
        match self.kind() {
            ErrorKind::InvalidParameter => EfiStatus::INVALID_PARAMETER,
            ErrorKind::OutOfResources => EfiStatus::OUT_OF_RESOURCES,
            ErrorKind::DeviceError => EfiStatus::DEVICE_ERROR,
        }
    }
}

/// Firmware status word (high bit set for errors)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EfiStatus(u64);

impl EfiStatus {
    const ERROR_BIT: u64 = 1 << 63;

    pub const SUCCESS: Self = Self(0);
    pub const INVALID_PARAMETER: Self = Self(Self::ERROR_BIT | 2);
    pub const DEVICE_ERROR: Self = Self(Self::ERROR_BIT | 7);
    pub const OUT_OF_RESOURCES: Self = Self(Self::ERROR_BIT | 9);

    /// Raw value
    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_error(self) -> bool {
        self.0 & Self::ERROR_BIT != 0
    }
}

impl fmt::Debug for EfiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::SUCCESS => "EFI_SUCCESS",
            Self::INVALID_PARAMETER => "EFI_INVALID_PARAMETER",
            Self::DEVICE_ERROR => "EFI_DEVICE_ERROR",
            Self::OUT_OF_RESOURCES => "EFI_OUT_OF_RESOURCES",
            _ => return write!(f, "EfiStatus({:#x})", self.0),
        };
        f.write_str(name)
    }
}

impl<T> From<&Result<T>> for EfiStatus {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::SUCCESS,
            Err(e) => e.status(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, DispatchError>;
