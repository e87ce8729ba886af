//! # Boot Loader
//!
//! Kernel image boot path.
//!
//! Responsibilities:
//! - Load the kernel image supplied to the platform
//! - Signal ready-to-boot and report the progress code
//! - Start the image, unload it if control comes back
//! - Log cycle-counter milestones around the pre-start phase
//!
//! Platform access goes through [`BootServices`]; [`MockBootServices`] stands
//! in for firmware in tests.

mod error;
mod loader;
mod mock;
mod services;

pub use error::{BootError, Result};
pub use loader::{try_run_kernel, BootReport};
pub use mock::{BootCall, MockBootConfig, MockBootServices};
pub use services::{BootServices, ImageHandle, StatusCode, StatusCodeType};
