//! Firmware boot services abstraction
//!
//! Everything the kernel boot path needs from the platform, behind one trait
//! so the sequencing can be exercised without firmware.

use std::fmt;

use crate::error::Result;

/// Opaque handle to a loaded kernel image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(u64);

impl ImageHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image#{:#x}", self.0)
    }
}

/// Status code class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StatusCodeType {
    Progress = 0x0000_0001,
    Error = 0x0000_0002,
    Debug = 0x0000_0003,
}

/// Status code reported to the platform's status-code listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode {
    pub code_type: StatusCodeType,
    pub value: u32,
}

impl StatusCode {
    const SOFTWARE: u32 = 0x0300_0000;
    const DXE_BS_DRIVER: u32 = Self::SOFTWARE | 0x0005_0000;
    const SUBCLASS_SPECIFIC: u32 = 0x0000_1000;

    /// DXE boot-service driver signalled the ready-to-boot event
    pub const READY_TO_BOOT: Self = Self {
        code_type: StatusCodeType::Progress,
        value: Self::DXE_BS_DRIVER | Self::SUBCLASS_SPECIFIC | 0x0000_0001,
    };
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:#010x})", self.code_type, self.value)
    }
}

/// Platform boot services used by the kernel boot path
///
/// Implementations own the firmware specifics; the boot path only decides the
/// order of calls.
pub trait BootServices: Send + Sync {
    /// Load the kernel image supplied to the platform
    fn load_kernel_image(&self) -> Result<ImageHandle>;

    /// Signal the ready-to-boot event group
    fn signal_ready_to_boot(&self);

    /// Report a status code
    fn report_status_code(&self, code: StatusCode);

    /// Transfer control to the loaded image
    ///
    /// Returns only if the image exits or fails to start.
    fn start_kernel_image(&self, image: ImageHandle) -> Result<()>;

    /// Release a loaded image
    fn unload_kernel_image(&self, image: ImageHandle) -> Result<()>;

    /// Free-running cycle counter
    fn read_cycle_counter(&self) -> u64;

    /// Ticks per second of the cycle counter, 0 if unknown
    fn performance_counter_frequency(&self) -> u64;
}
