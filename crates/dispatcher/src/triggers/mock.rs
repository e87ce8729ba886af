//! Mock hardware trigger
//!
//! Scriptable stand-in for chipset SMI sources: records every enable/disable
//! call, injects failures, and latches status words for `poll`.

use contracts::{HardwareTrigger, SmiType, TriggerError};
use spin::Mutex;
use tracing::instrument;

use crate::types::SmiTypeSet;

/// Mock trigger configuration
#[derive(Debug, Default, Clone)]
pub struct MockTriggerConfig {
    /// Sub-types whose enable call fails
    pub fail_enable: Vec<SmiType>,
    /// Sub-types whose disable call fails
    pub fail_disable: Vec<SmiType>,
}

/// One recorded call into the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCall {
    Enable(SmiType),
    Disable(SmiType),
}

struct MockState {
    enabled: SmiTypeSet,
    fail_enable: SmiTypeSet,
    fail_disable: SmiTypeSet,
    latched: [Option<u32>; SmiType::COUNT],
    calls: Vec<TriggerCall>,
}

/// Mock hardware trigger
pub struct MockTrigger {
    state: Mutex<MockState>,
}

impl MockTrigger {
    /// Create a trigger that accepts every call
    pub fn new() -> Self {
        Self::with_config(MockTriggerConfig::default())
    }

    /// Create a trigger with injected failures
    pub fn with_config(config: MockTriggerConfig) -> Self {
        Self {
            state: Mutex::new(MockState {
                enabled: SmiTypeSet::EMPTY,
                fail_enable: config.fail_enable.into_iter().collect(),
                fail_disable: config.fail_disable.into_iter().collect(),
                latched: [None; SmiType::COUNT],
                calls: Vec::new(),
            }),
        }
    }

    /// Make subsequent enable calls for `smi_type` fail
    pub fn fail_enable(&self, smi_type: SmiType) {
        self.state.lock().fail_enable.insert(smi_type);
    }

    /// Make subsequent disable calls for `smi_type` fail
    pub fn fail_disable(&self, smi_type: SmiType) {
        self.state.lock().fail_disable.insert(smi_type);
    }

    /// Clear injected failures for `smi_type`
    pub fn recover(&self, smi_type: SmiType) {
        let mut state = self.state.lock();
        state.fail_enable.remove(smi_type);
        state.fail_disable.remove(smi_type);
    }

    /// Latch status bits for `smi_type`, as if the source fired
    ///
    /// Bits accumulate until the next `poll` acknowledges them.
    pub fn raise(&self, smi_type: SmiType, status: u32) {
        let mut state = self.state.lock();
        let slot = &mut state.latched[smi_type.as_raw() as usize];
        *slot = Some(slot.unwrap_or(0) | status);
    }

    pub fn is_enabled(&self, smi_type: SmiType) -> bool {
        self.state.lock().enabled.contains(smi_type)
    }

    /// Currently enabled sources
    pub fn enabled(&self) -> SmiTypeSet {
        self.state.lock().enabled
    }

    /// Number of enable calls for `smi_type`, failed ones included
    pub fn enable_calls(&self, smi_type: SmiType) -> usize {
        self.count(TriggerCall::Enable(smi_type))
    }

    /// Number of disable calls for `smi_type`, failed ones included
    pub fn disable_calls(&self, smi_type: SmiType) -> usize {
        self.count(TriggerCall::Disable(smi_type))
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<TriggerCall> {
        self.state.lock().calls.clone()
    }

    fn count(&self, call: TriggerCall) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == call).count()
    }
}

impl Default for MockTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareTrigger for MockTrigger {
    #[instrument(name = "mock_trigger_enable", skip(self), fields(smi_type = %smi_type))]
    fn enable(&self, smi_type: SmiType) -> Result<(), TriggerError> {
        let mut state = self.state.lock();
        state.calls.push(TriggerCall::Enable(smi_type));
        if state.fail_enable.contains(smi_type) {
            return Err(TriggerError::refused(smi_type, "injected enable failure"));
        }
        state.enabled.insert(smi_type);
        Ok(())
    }

    #[instrument(name = "mock_trigger_disable", skip(self), fields(smi_type = %smi_type))]
    fn disable(&self, smi_type: SmiType) -> Result<(), TriggerError> {
        let mut state = self.state.lock();
        state.calls.push(TriggerCall::Disable(smi_type));
        if state.fail_disable.contains(smi_type) {
            return Err(TriggerError::refused(smi_type, "injected disable failure"));
        }
        state.enabled.remove(smi_type);
        Ok(())
    }

    fn poll(&self, smi_type: SmiType) -> Option<u32> {
        let mut state = self.state.lock();
        state.latched[smi_type.as_raw() as usize].take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_in_order() {
        let trigger = MockTrigger::new();
        trigger.enable(SmiType::Pme).unwrap();
        trigger.disable(SmiType::Pme).unwrap();
        assert_eq!(
            trigger.calls(),
            vec![TriggerCall::Enable(SmiType::Pme), TriggerCall::Disable(SmiType::Pme)]
        );
        assert!(!trigger.is_enabled(SmiType::Pme));
    }

    #[test]
    fn test_injected_failures() {
        let trigger = MockTrigger::with_config(MockTriggerConfig {
            fail_enable: vec![SmiType::Spi],
            fail_disable: vec![],
        });
        let err = trigger.enable(SmiType::Spi).unwrap_err();
        assert!(err.to_string().contains("injected enable failure"));
        assert!(!trigger.is_enabled(SmiType::Spi));
        assert_eq!(trigger.enable_calls(SmiType::Spi), 1);

        trigger.recover(SmiType::Spi);
        trigger.enable(SmiType::Spi).unwrap();
        assert!(trigger.is_enabled(SmiType::Spi));

        trigger.fail_disable(SmiType::Spi);
        assert!(trigger.disable(SmiType::Spi).is_err());
        assert!(trigger.is_enabled(SmiType::Spi));
    }

    #[test]
    fn test_poll_acknowledges_latched_status() {
        let trigger = MockTrigger::new();
        assert_eq!(trigger.poll(SmiType::RtcAlarm), None);

        trigger.raise(SmiType::RtcAlarm, 0x10);
        trigger.raise(SmiType::RtcAlarm, 0x20);
        assert_eq!(trigger.poll(SmiType::RtcAlarm), Some(0x30));
        assert_eq!(trigger.poll(SmiType::RtcAlarm), None);
    }
}
