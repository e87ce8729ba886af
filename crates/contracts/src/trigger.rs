//! HardwareTrigger trait - the source-specific enable/disable hook
//!
//! The dispatcher is the only caller. Implementations own the chipset
//! register layout; the dispatcher only decides *when* to call them.

use std::sync::Arc;

use crate::{SmiType, TriggerError};

/// Hardware hook for one family of SMI sources.
///
/// `enable`/`disable` are called with the dispatcher's table locked, so they
/// must not block and must not call back into the dispatcher. `poll` runs on
/// the trigger path and must be allocation-free.
pub trait HardwareTrigger: Send + Sync {
    /// Arm the source for `smi_type`
    ///
    /// # Errors
    /// Returns [`TriggerError`] if the source cannot be armed.
    fn enable(&self, smi_type: SmiType) -> Result<(), TriggerError>;

    /// Disarm the source for `smi_type`
    fn disable(&self, smi_type: SmiType) -> Result<(), TriggerError>;

    /// Read and acknowledge the status of `smi_type`
    ///
    /// Returns the raw status word if the source fired since the last poll.
    fn poll(&self, smi_type: SmiType) -> Option<u32>;
}

impl<T: HardwareTrigger + ?Sized> HardwareTrigger for Arc<T> {
    fn enable(&self, smi_type: SmiType) -> Result<(), TriggerError> {
        (**self).enable(smi_type)
    }

    fn disable(&self, smi_type: SmiType) -> Result<(), TriggerError> {
        (**self).disable(smi_type)
    }

    fn poll(&self, smi_type: SmiType) -> Option<u32> {
        (**self).poll(smi_type)
    }
}

impl<T: HardwareTrigger + ?Sized> HardwareTrigger for Box<T> {
    fn enable(&self, smi_type: SmiType) -> Result<(), TriggerError> {
        (**self).enable(smi_type)
    }

    fn disable(&self, smi_type: SmiType) -> Result<(), TriggerError> {
        (**self).disable(smi_type)
    }

    fn poll(&self, smi_type: SmiType) -> Option<u32> {
        (**self).poll(smi_type)
    }
}
