//! DispatchBlueprint - Config Loader output
//!
//! Describes one dispatcher instance: arena capacity, the sub-types it
//! recognises, the children to register, and an optional firing scenario.

use serde::{Deserialize, Serialize};

use crate::{OwnerId, SmiType};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dispatcher configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Dispatcher instance settings
    #[serde(default)]
    pub dispatcher: DispatcherSettings,

    /// Children registered at start-up
    #[serde(default)]
    pub children: Vec<ChildConfig>,

    /// Firing scenario for the simulator
    #[serde(default)]
    pub scenario: Option<ScenarioConfig>,
}

/// Upper bound on registration slots per dispatcher instance
///
/// Handles carry the slot index as `u32`; the arena is allocated up front.
pub const MAX_CAPACITY: usize = 1 << 16;

/// Dispatcher instance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherSettings {
    /// Maximum number of live registrations
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Sub-types this instance recognises (empty = all)
    #[serde(default)]
    pub supported_types: Vec<SmiType>,
}

impl DispatcherSettings {
    /// Effective supported set (expands the empty list to every sub-type)
    pub fn effective_types(&self) -> Vec<SmiType> {
        if self.supported_types.is_empty() {
            SmiType::ALL.to_vec()
        } else {
            self.supported_types.clone()
        }
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            supported_types: Vec::new(),
        }
    }
}

fn default_capacity() -> usize {
    64
}

/// A child to register at start-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildConfig {
    /// Unique child name (used as handler context)
    pub name: String,

    /// Sub-type the child listens to
    pub smi_type: SmiType,

    /// Owning driver context
    #[serde(default)]
    pub owner: Option<OwnerId>,
}

/// Scripted firings for the simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Delay between firings in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Unregister every child once the events are exhausted
    #[serde(default = "default_unregister_after")]
    pub unregister_after: bool,

    /// Firing sequence
    #[serde(default)]
    pub events: Vec<FireEvent>,
}

fn default_interval_ms() -> u64 {
    10
}

fn default_unregister_after() -> bool {
    true
}

/// One scripted firing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireEvent {
    /// Sub-type to fire
    pub smi_type: SmiType,

    /// Number of consecutive firings
    #[serde(default = "default_fire_count")]
    pub count: u32,

    /// Status word delivered with each firing
    #[serde(default)]
    pub status: u32,
}

fn default_fire_count() -> u32 {
    1
}
