//! LogTrigger - logs arm/disarm transitions via tracing

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{HardwareTrigger, SmiType, TriggerError};
use tracing::info;

/// Trigger with no hardware behind it.
///
/// Tracks which sources are armed so callers can check that the dispatcher
/// keeps the hardware in step with its table. Never reports a firing.
#[derive(Debug)]
pub struct LogTrigger {
    name: String,
    armed: AtomicU64,
}

impl LogTrigger {
    /// Create a new LogTrigger with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            armed: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Is the source for `smi_type` currently armed
    pub fn is_armed(&self, smi_type: SmiType) -> bool {
        self.armed.load(Ordering::Acquire) & (1u64 << smi_type.as_raw()) != 0
    }

    /// Number of armed sources
    pub fn armed_count(&self) -> usize {
        self.armed.load(Ordering::Acquire).count_ones() as usize
    }
}

impl HardwareTrigger for LogTrigger {
    fn enable(&self, smi_type: SmiType) -> Result<(), TriggerError> {
        self.armed
            .fetch_or(1u64 << smi_type.as_raw(), Ordering::AcqRel);
        info!(trigger = %self.name, smi_type = %smi_type, "Source armed");
        Ok(())
    }

    fn disable(&self, smi_type: SmiType) -> Result<(), TriggerError> {
        self.armed
            .fetch_and(!(1u64 << smi_type.as_raw()), Ordering::AcqRel);
        info!(trigger = %self.name, smi_type = %smi_type, "Source disarmed");
        Ok(())
    }

    fn poll(&self, _smi_type: SmiType) -> Option<u32> {
        None
    }
}
