//! DispatchEngine - parent dispatcher that multiplexes SMI sources among children
//!
//! Foreground calls (`register`, `unregister`, `unregister_owner`) take the
//! table's write lock for the whole mutation, including the trigger
//! enable/disable call. The trigger path (`invoke`, `dispatch_pending`) takes
//! the read lock, so it never sees a half-applied mutation and several CPUs can
//! dispatch at once. The lock spins; nothing here can sleep.
//!
//! Writers claim the lock's upgradable slot before upgrading. Once claimed, new
//! readers are refused, so a writer waits only for dispatches already in
//! flight and a continuous stream of firings cannot hold it off.
//!
//! The trigger path does not allocate and does not log; handler failures are
//! only counted. Handlers run while the read lock is held and must not call
//! back into the engine.

use std::fmt;
use std::sync::Arc;

use spin::{RwLock, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};

use contracts::{
    DispatchHandle, DispatcherSettings, FiringDetails, HardwareTrigger, OwnerId, SmiEvent,
    SmiHandler, SmiType, TriggerError, MAX_CAPACITY,
};

use crate::error::{DispatchError, Result};
use crate::metrics::DispatchMetrics;
use crate::table::DispatchTable;
use crate::types::SmiTypeSet;

/// Default number of registration slots
pub const DEFAULT_CAPACITY: usize = 64;

/// Builder for creating a DispatchEngine
pub struct DispatchEngineBuilder<T> {
    trigger: T,
    capacity: usize,
    supported: SmiTypeSet,
}

impl<T: HardwareTrigger> DispatchEngineBuilder<T> {
    /// Start from defaults: [`DEFAULT_CAPACITY`] slots, every sub-type supported
    pub fn new(trigger: T) -> Self {
        Self {
            trigger,
            capacity: DEFAULT_CAPACITY,
            supported: SmiTypeSet::all(),
        }
    }

    /// Maximum number of live registrations, clamped to [`MAX_CAPACITY`]
    pub fn capacity(mut self, capacity: usize) -> Self {
        if capacity > MAX_CAPACITY {
            warn!(capacity, max = MAX_CAPACITY, "Requested capacity clamped");
        }
        self.capacity = capacity.min(MAX_CAPACITY);
        self
    }

    /// Restrict the sub-types this instance recognises
    pub fn supported_types(mut self, types: impl IntoIterator<Item = SmiType>) -> Self {
        self.supported = types.into_iter().collect();
        self
    }

    /// Build the engine
    pub fn build<C: 'static>(self) -> DispatchEngine<T, C> {
        debug!(
            capacity = self.capacity,
            supported = self.supported.len(),
            "DispatchEngine created"
        );
        DispatchEngine {
            table: RwLock::new(DispatchTable::new(self.capacity)),
            trigger: self.trigger,
            supported: self.supported,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }
}

/// Convenience function to create an engine from configuration
pub fn create_engine<T, C>(settings: &DispatcherSettings, trigger: T) -> DispatchEngine<T, C>
where
    T: HardwareTrigger,
    C: 'static,
{
    DispatchEngineBuilder::new(trigger)
        .capacity(settings.capacity)
        .supported_types(settings.effective_types())
        .build()
}

/// Parent dispatcher for one family of SMI sources.
///
/// `T` is the hardware hook, `C` the per-registration context type.
pub struct DispatchEngine<T, C> {
    table: RwLock<DispatchTable<C>>,
    trigger: T,
    supported: SmiTypeSet,
    metrics: Arc<DispatchMetrics>,
}

impl<T: HardwareTrigger, C: 'static> DispatchEngine<T, C> {
    /// Register a child handler for `smi_type`.
    ///
    /// Enables the hardware trigger if this is the first registration for the
    /// sub-type. All-or-nothing: on any error no registration remains and the
    /// trigger state is unchanged.
    ///
    /// # Errors
    /// - [`DispatchError::UnsupportedType`] if the sub-type is not recognised
    /// - [`DispatchError::OutOfResources`] if every slot is in use
    /// - [`DispatchError::DeviceError`] if the trigger refused to enable
    #[instrument(name = "dispatch_register", skip(self, handler, context), fields(smi_type = %smi_type))]
    pub fn register<H>(&self, smi_type: SmiType, handler: H, context: C) -> Result<DispatchHandle>
    where
        H: SmiHandler<C> + 'static,
    {
        self.register_inner(None, smi_type, Box::new(handler), context)
    }

    /// Register a child handler on behalf of `owner`.
    ///
    /// Same contract as [`register`](Self::register); the registration is
    /// also removed by [`unregister_owner`](Self::unregister_owner).
    #[instrument(
        name = "dispatch_register_owned",
        skip(self, handler, context),
        fields(owner = %owner, smi_type = %smi_type)
    )]
    pub fn register_owned<H>(
        &self,
        owner: OwnerId,
        smi_type: SmiType,
        handler: H,
        context: C,
    ) -> Result<DispatchHandle>
    where
        H: SmiHandler<C> + 'static,
    {
        self.register_inner(Some(owner), smi_type, Box::new(handler), context)
    }

    fn register_inner(
        &self,
        owner: Option<OwnerId>,
        smi_type: SmiType,
        handler: Box<dyn SmiHandler<C>>,
        context: C,
    ) -> Result<DispatchHandle> {
        if !self.supported.contains(smi_type) {
            debug!(smi_type = %smi_type, "Rejected registration for unsupported sub-type");
            return Err(DispatchError::UnsupportedType(smi_type));
        }

        let mut table = self.write_table();
        let first = !table.has_type(smi_type);

        let Some(handle) = table.insert(smi_type, owner, handler, context) else {
            let capacity = table.capacity();
            drop(table);
            warn!(smi_type = %smi_type, capacity, "Registration arena exhausted");
            return Err(DispatchError::OutOfResources { capacity });
        };

        if first {
            if let Err(source) = self.trigger.enable(smi_type) {
                let rolled_back = table.remove(handle);
                drop(table);
                drop(rolled_back);

                self.metrics.inc_enable_failures();
                warn!(smi_type = %smi_type, error = %source, "Trigger enable failed, registration rolled back");
                return Err(DispatchError::device(smi_type, source));
            }
        }
        drop(table);

        self.metrics.inc_registrations();
        if first {
            info!(smi_type = %smi_type, %handle, "SMI source enabled");
        }
        debug!(smi_type = %smi_type, %handle, "Child registered");
        Ok(handle)
    }

    /// Unregister the child named by `handle`.
    ///
    /// Disables the hardware trigger when the last child of the sub-type
    /// leaves. A disable failure is logged and counted; the registration is
    /// removed regardless.
    ///
    /// # Errors
    /// [`DispatchError::UnknownHandle`] if `handle` does not name a live
    /// registration.
    #[instrument(name = "dispatch_unregister", skip(self), fields(handle = %handle))]
    pub fn unregister(&self, handle: DispatchHandle) -> Result<()> {
        let mut table = self.write_table();
        let Some(removed) = table.remove(handle) else {
            drop(table);
            debug!(%handle, "Rejected unregister for unknown handle");
            return Err(DispatchError::UnknownHandle(handle));
        };

        let smi_type = removed.registration.smi_type();
        let disabled = removed
            .last_of_type
            .then(|| self.trigger.disable(smi_type));
        drop(table);

        self.finish_removal(handle, smi_type, disabled);
        drop(removed);
        Ok(())
    }

    /// Force-unregister every registration owned by `owner`.
    ///
    /// Returns the number of registrations removed; an unknown owner removes
    /// nothing.
    #[instrument(name = "dispatch_unregister_owner", skip(self), fields(owner = %owner))]
    pub fn unregister_owner(&self, owner: &OwnerId) -> usize {
        let mut table = self.write_table();
        let handles = table.handles_owned_by(owner);

        let mut removed = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Some(entry) = table.remove(handle) {
                let smi_type = entry.registration.smi_type();
                let disabled = entry.last_of_type.then(|| self.trigger.disable(smi_type));
                removed.push((entry, disabled));
            }
        }
        drop(table);

        let count = removed.len();
        for (entry, disabled) in removed {
            let registration = entry.registration;
            self.finish_removal(registration.handle(), registration.smi_type(), disabled);
        }

        info!(owner = %owner, count, "Owner registrations torn down");
        count
    }

    fn finish_removal(
        &self,
        handle: DispatchHandle,
        smi_type: SmiType,
        disabled: Option<std::result::Result<(), TriggerError>>,
    ) {
        self.metrics.inc_unregistrations();
        match disabled {
            Some(Ok(())) => info!(smi_type = %smi_type, %handle, "SMI source disabled"),
            Some(Err(e)) => {
                self.metrics.inc_disable_failures();
                warn!(smi_type = %smi_type, %handle, error = %e, "Trigger disable failed after last child left");
            }
            None => {}
        }
        debug!(smi_type = %smi_type, %handle, "Child unregistered");
    }

    /// Run every handler registered for `smi_type`, in registration order.
    ///
    /// Called from the trigger path. A sub-type with no registrations is a
    /// no-op. Handler failures are counted and do not stop the
    /// remaining handlers. Returns the number of handlers called.
    pub fn invoke(&self, smi_type: SmiType, details: FiringDetails<'_>) -> usize {
        let table = self.table.read();
        self.invoke_locked(&table, smi_type, details)
    }

    /// Poll every enabled source and invoke the ones that fired.
    ///
    /// This is the root SMI handler: sources are visited in raw-value order.
    /// Returns the total number of handlers called.
    pub fn dispatch_pending(&self, cpu_index: usize, comm_buffer: Option<&[u8]>) -> usize {
        let table = self.table.read();
        let mut calls = 0;
        for smi_type in table.active_types() {
            if let Some(status) = self.trigger.poll(smi_type) {
                let details = FiringDetails {
                    status,
                    cpu_index,
                    comm_buffer,
                };
                calls += self.invoke_locked(&table, smi_type, details);
            }
        }
        calls
    }

    fn invoke_locked(
        &self,
        table: &DispatchTable<C>,
        smi_type: SmiType,
        details: FiringDetails<'_>,
    ) -> usize {
        let mut calls = 0;
        for registration in table.iter_type(smi_type) {
            let event = SmiEvent {
                smi_type,
                handle: registration.handle,
                details,
            };
            if registration.handler.handle(&event, &registration.context).is_err() {
                self.metrics.inc_handler_failures();
            }
            calls += 1;
        }

        if calls == 0 {
            self.metrics.inc_idle_invocations();
        } else {
            self.metrics.inc_invocations();
            self.metrics.add_handler_calls(calls as u64);
        }
        calls
    }

    /// Does `handle` name a live registration
    pub fn is_registered(&self, handle: DispatchHandle) -> bool {
        self.table.read().contains(handle)
    }

    /// Run `f` against the registration named by `handle`
    pub fn with_registration<R>(
        &self,
        handle: DispatchHandle,
        f: impl FnOnce(&crate::table::Registration<C>) -> R,
    ) -> Option<R> {
        self.table.read().get(handle).map(f)
    }

    /// Number of live registrations
    pub fn registration_count(&self) -> usize {
        self.table.read().len()
    }

    /// Number of live registrations for `smi_type`
    pub fn handler_count(&self, smi_type: SmiType) -> usize {
        self.table.read().count_for(smi_type)
    }

    /// Sub-types with at least one registration (trigger enabled)
    pub fn active_types(&self) -> SmiTypeSet {
        self.table.read().active_types().collect()
    }
}

impl<T, C> DispatchEngine<T, C> {
    fn write_table(&self) -> RwLockWriteGuard<'_, DispatchTable<C>> {
        self.table.upgradeable_read().upgrade()
    }

    /// Does this instance recognise `smi_type`
    pub fn is_supported(&self, smi_type: SmiType) -> bool {
        self.supported.contains(smi_type)
    }

    /// Sub-types this instance recognises
    pub fn supported_types(&self) -> SmiTypeSet {
        self.supported
    }

    /// Maximum number of live registrations
    pub fn capacity(&self) -> usize {
        self.table.read().capacity()
    }

    /// Shared metrics
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Hardware hook
    pub fn trigger(&self) -> &T {
        &self.trigger
    }
}

impl<T, C> fmt::Debug for DispatchEngine<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("table", &*self.table.read())
            .field("supported", &self.supported)
            .finish_non_exhaustive()
    }
}
