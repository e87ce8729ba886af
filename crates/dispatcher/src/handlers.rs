//! LogHandler - child handler that logs each firing via tracing

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{HandlerResult, SmiEvent, SmiHandler};
use tracing::info;

/// Child handler that logs every firing it receives
#[derive(Debug, Clone)]
pub struct LogHandler {
    name: String,
    hits: Arc<AtomicU64>,
}

impl LogHandler {
    /// Create a new LogHandler with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hits: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared hit counter, still readable after the handler is registered
    pub fn hits(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.hits)
    }
}

impl<C: fmt::Debug> SmiHandler<C> for LogHandler {
    fn handle(&self, event: &SmiEvent<'_>, context: &C) -> HandlerResult {
        let hit = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            child = %self.name,
            smi_type = %event.smi_type,
            handle = %event.handle,
            status = event.details.status,
            cpu = event.details.cpu_index,
            ?context,
            hit,
            "SMI handled"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DispatchHandle, FiringDetails, SmiType};

    #[test]
    fn test_log_handler_counts_hits() {
        let handler = LogHandler::new("watchdog");
        let hits = handler.hits();
        let event = SmiEvent {
            smi_type: SmiType::TcoTimeout,
            handle: DispatchHandle::new(3, 1),
            details: FiringDetails::with_status(8),
        };

        handler.handle(&event, &"tco").unwrap();
        handler.handle(&event, &"tco").unwrap();
        assert_eq!(hits.load(Ordering::Relaxed), 2);
        assert_eq!(handler.name(), "watchdog");
    }
}
