//! Built-in [`HardwareTrigger`](contracts::HardwareTrigger) implementations
//!
//! - `LogTrigger`: no hardware, records arm state and logs transitions
//! - `MockTrigger`: scriptable trigger with failure injection, for tests

mod log;
mod mock;

pub use log::LogTrigger;
pub use mock::{MockTrigger, MockTriggerConfig, TriggerCall};
