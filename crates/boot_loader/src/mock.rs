//! Mock boot services
//!
//! Records every call in order and injects load/start/unload failures.

use std::sync::atomic::{AtomicU64, Ordering};

use spin::Mutex;
use tracing::instrument;

use crate::error::{BootError, Result};
use crate::services::{BootServices, ImageHandle, StatusCode};

/// Mock boot services configuration
#[derive(Debug, Clone)]
pub struct MockBootConfig {
    /// Error returned by `load_kernel_image`
    pub fail_load: Option<BootError>,
    /// Message for a failing `start_kernel_image`
    pub fail_start: Option<String>,
    /// Make `unload_kernel_image` fail
    pub fail_unload: bool,
    /// Reported counter frequency
    pub frequency: u64,
    /// Cycle counter advance per read
    pub tick_step: u64,
}

impl Default for MockBootConfig {
    fn default() -> Self {
        Self {
            fail_load: None,
            fail_start: None,
            fail_unload: false,
            frequency: 2_000_000_000,
            tick_step: 1_500,
        }
    }
}

/// One recorded call into the boot services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootCall {
    LoadKernelImage,
    SignalReadyToBoot,
    ReportStatusCode(StatusCode),
    StartKernelImage(ImageHandle),
    UnloadKernelImage(ImageHandle),
    ReadCycleCounter,
    PerformanceCounterFrequency,
}

/// Mock boot services
pub struct MockBootServices {
    config: MockBootConfig,
    ticks: AtomicU64,
    next_image: AtomicU64,
    loaded: Mutex<Vec<ImageHandle>>,
    calls: Mutex<Vec<BootCall>>,
}

impl MockBootServices {
    /// Raw value of the first image handle handed out
    pub const FIRST_IMAGE: u64 = 0x1000;

    pub fn new() -> Self {
        Self::with_config(MockBootConfig::default())
    }

    pub fn with_config(config: MockBootConfig) -> Self {
        Self {
            config,
            ticks: AtomicU64::new(0),
            next_image: AtomicU64::new(Self::FIRST_IMAGE),
            loaded: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<BootCall> {
        self.calls.lock().clone()
    }

    /// Images loaded and not yet unloaded
    pub fn loaded_images(&self) -> Vec<ImageHandle> {
        self.loaded.lock().clone()
    }

    fn record(&self, call: BootCall) {
        self.calls.lock().push(call);
    }
}

impl Default for MockBootServices {
    fn default() -> Self {
        Self::new()
    }
}

impl BootServices for MockBootServices {
    #[instrument(name = "mock_boot_load", skip(self))]
    fn load_kernel_image(&self) -> Result<ImageHandle> {
        self.record(BootCall::LoadKernelImage);
        if let Some(err) = &self.config.fail_load {
            return Err(err.clone());
        }
        let image = ImageHandle::new(self.next_image.fetch_add(1, Ordering::SeqCst));
        self.loaded.lock().push(image);
        Ok(image)
    }

    fn signal_ready_to_boot(&self) {
        self.record(BootCall::SignalReadyToBoot);
    }

    fn report_status_code(&self, code: StatusCode) {
        self.record(BootCall::ReportStatusCode(code));
    }

    #[instrument(name = "mock_boot_start", skip(self), fields(image = %image))]
    fn start_kernel_image(&self, image: ImageHandle) -> Result<()> {
        self.record(BootCall::StartKernelImage(image));
        match &self.config.fail_start {
            Some(message) => Err(BootError::start(image, message.clone())),
            None => Ok(()),
        }
    }

    #[instrument(name = "mock_boot_unload", skip(self), fields(image = %image))]
    fn unload_kernel_image(&self, image: ImageHandle) -> Result<()> {
        self.record(BootCall::UnloadKernelImage(image));
        if self.config.fail_unload {
            return Err(BootError::unload(image, "injected unload failure"));
        }
        self.loaded.lock().retain(|loaded| *loaded != image);
        Ok(())
    }

    fn read_cycle_counter(&self) -> u64 {
        self.record(BootCall::ReadCycleCounter);
        self.ticks.fetch_add(self.config.tick_step, Ordering::SeqCst) + self.config.tick_step
    }

    fn performance_counter_frequency(&self) -> u64 {
        self.record(BootCall::PerformanceCounterFrequency);
        self.config.frequency
    }
}
