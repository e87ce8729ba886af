//! Dispatch metrics for observability
//!
//! Plain atomics so the trigger path can record without locking or allocating.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one dispatcher instance
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Successful registrations
    registrations: AtomicU64,
    /// Registrations removed (explicitly or by owner teardown)
    unregistrations: AtomicU64,
    /// Invoke calls that reached at least one handler
    invocations: AtomicU64,
    /// Invoke calls for a sub-type with no registrations
    idle_invocations: AtomicU64,
    /// Individual handler calls
    handler_calls: AtomicU64,
    /// Handler calls that returned an error
    handler_failures: AtomicU64,
    /// Trigger enable refusals (registration rolled back)
    enable_failures: AtomicU64,
    /// Trigger disable failures (registration still removed)
    disable_failures: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrations(&self) -> u64 {
        self.registrations.load(Ordering::Relaxed)
    }

    pub fn inc_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unregistrations(&self) -> u64 {
        self.unregistrations.load(Ordering::Relaxed)
    }

    pub fn inc_unregistrations(&self) {
        self.unregistrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn inc_invocations(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn idle_invocations(&self) -> u64 {
        self.idle_invocations.load(Ordering::Relaxed)
    }

    pub fn inc_idle_invocations(&self) {
        self.idle_invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handler_calls(&self) -> u64 {
        self.handler_calls.load(Ordering::Relaxed)
    }

    pub fn add_handler_calls(&self, calls: u64) {
        self.handler_calls.fetch_add(calls, Ordering::Relaxed);
    }

    pub fn handler_failures(&self) -> u64 {
        self.handler_failures.load(Ordering::Relaxed)
    }

    pub fn inc_handler_failures(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn enable_failures(&self) -> u64 {
        self.enable_failures.load(Ordering::Relaxed)
    }

    pub fn inc_enable_failures(&self) {
        self.enable_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn disable_failures(&self) -> u64 {
        self.disable_failures.load(Ordering::Relaxed)
    }

    pub fn inc_disable_failures(&self) {
        self.disable_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            registrations: self.registrations(),
            unregistrations: self.unregistrations(),
            invocations: self.invocations(),
            idle_invocations: self.idle_invocations(),
            handler_calls: self.handler_calls(),
            handler_failures: self.handler_failures(),
            enable_failures: self.enable_failures(),
            disable_failures: self.disable_failures(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub registrations: u64,
    pub unregistrations: u64,
    pub invocations: u64,
    pub idle_invocations: u64,
    pub handler_calls: u64,
    pub handler_failures: u64,
    pub enable_failures: u64,
    pub disable_failures: u64,
}

impl MetricsSnapshot {
    /// Registrations still live according to the counters
    pub fn live(&self) -> u64 {
        self.registrations.saturating_sub(self.unregistrations)
    }
}
