//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the SMI dispatch workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Dispatch Model
//! - A child registers interest in one [`SmiType`] and receives a [`DispatchHandle`]
//! - The parent dispatcher drives a [`HardwareTrigger`] per sub-type
//! - When a trigger fires, every [`SmiHandler`] of that sub-type runs in registration order

mod blueprint;
mod error;
mod handle;
mod handler;
mod owner_id;
mod smi_type;
mod trigger;

pub use blueprint::*;
pub use error::*;
pub use handle::DispatchHandle;
pub use handler::{handler_fn, FiringDetails, FnHandler, HandlerResult, SmiEvent, SmiHandler};
pub use owner_id::OwnerId;
pub use smi_type::SmiType;
pub use trigger::HardwareTrigger;
