//! Kernel boot sequence

use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::error::Result;
use crate::services::{BootServices, StatusCode};

/// Timing of the pre-start phase of a kernel boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootReport {
    /// Cycle counter before the image was loaded
    pub begin_ticks: u64,
    /// Cycle counter after ready-to-boot was signalled
    pub end_ticks: u64,
    /// Cycle counter frequency in Hz, 0 if unknown
    pub frequency: u64,
}

impl BootReport {
    pub fn elapsed_ticks(&self) -> u64 {
        self.end_ticks.saturating_sub(self.begin_ticks)
    }

    /// Wall time between BEGIN and END, if the frequency is known
    pub fn elapsed(&self) -> Option<Duration> {
        if self.frequency == 0 {
            return None;
        }
        let nanos = u128::from(self.elapsed_ticks()) * 1_000_000_000 / u128::from(self.frequency);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}

/// Load and start the kernel image supplied to the platform.
///
/// Sequence: load, signal ready-to-boot, report [`StatusCode::READY_TO_BOOT`],
/// start, unload. A load failure is returned before anything is signalled. A
/// start failure is logged and returned after the image is unloaded.
///
/// # Errors
/// Whatever [`BootServices::load_kernel_image`] or
/// [`BootServices::start_kernel_image`] returned, unchanged.
#[instrument(name = "try_run_kernel", skip(services))]
pub fn try_run_kernel<S: BootServices + ?Sized>(services: &S) -> Result<BootReport> {
    let begin_ticks = services.read_cycle_counter();
    info!(ticks = begin_ticks, "Kernel boot BEGIN");

    let image = services.load_kernel_image()?;

    services.signal_ready_to_boot();
    services.report_status_code(StatusCode::READY_TO_BOOT);

    let end_ticks = services.read_cycle_counter();
    let frequency = services.performance_counter_frequency();
    info!(ticks = end_ticks, frequency, "Kernel boot END");

    let started = services.start_kernel_image(image);
    if let Err(e) = &started {
        error!(%image, error = %e, "Kernel image start failed");
    }

    if let Err(e) = services.unload_kernel_image(image) {
        warn!(%image, error = %e, "Kernel image unload failed");
    }

    started.map(|()| BootReport {
        begin_ticks,
        end_ticks,
        frequency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BootError;
    use crate::mock::{BootCall, MockBootConfig, MockBootServices};
    use crate::services::ImageHandle;

    #[test]
    fn test_successful_boot_sequence() {
        let services = MockBootServices::new();
        let report = try_run_kernel(&services).unwrap();

        let image = ImageHandle::new(MockBootServices::FIRST_IMAGE);
        assert_eq!(
            services.calls(),
            vec![
                BootCall::ReadCycleCounter,
                BootCall::LoadKernelImage,
                BootCall::SignalReadyToBoot,
                BootCall::ReportStatusCode(StatusCode::READY_TO_BOOT),
                BootCall::ReadCycleCounter,
                BootCall::PerformanceCounterFrequency,
                BootCall::StartKernelImage(image),
                BootCall::UnloadKernelImage(image),
            ]
        );
        assert!(report.end_ticks > report.begin_ticks);
        assert_eq!(report.frequency, MockBootConfig::default().frequency);
    }

    #[test]
    fn test_load_failure_returns_unchanged() {
        let services = MockBootServices::with_config(MockBootConfig {
            fail_load: Some(BootError::NotFound),
            ..Default::default()
        });

        let err = try_run_kernel(&services).unwrap_err();
        assert_eq!(err, BootError::NotFound);
        assert_eq!(
            services.calls(),
            vec![BootCall::ReadCycleCounter, BootCall::LoadKernelImage]
        );
    }

    #[test]
    fn test_start_failure_still_unloads() {
        let services = MockBootServices::with_config(MockBootConfig {
            fail_start: Some("security violation".into()),
            ..Default::default()
        });

        let err = try_run_kernel(&services).unwrap_err();
        let image = ImageHandle::new(MockBootServices::FIRST_IMAGE);
        assert_eq!(err, BootError::start(image, "security violation"));
        assert_eq!(services.calls().last(), Some(&BootCall::UnloadKernelImage(image)));
        assert!(services.loaded_images().is_empty());
    }

    #[test]
    fn test_unload_failure_does_not_mask_start_status() {
        let services = MockBootServices::with_config(MockBootConfig {
            fail_unload: true,
            ..Default::default()
        });
        assert!(try_run_kernel(&services).is_ok());
    }

    #[test]
    fn test_report_elapsed() {
        let report = BootReport {
            begin_ticks: 1_000,
            end_ticks: 3_000,
            frequency: 1_000_000,
        };
        assert_eq!(report.elapsed_ticks(), 2_000);
        assert_eq!(report.elapsed(), Some(Duration::from_millis(2)));

        let unknown = BootReport { frequency: 0, ..report };
        assert_eq!(unknown.elapsed(), None);
    }
}
