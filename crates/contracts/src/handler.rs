//! SmiHandler trait - child dispatch function
//!
//! A child handler is invoked on the trigger path with the firing event and
//! the context it supplied at registration time.

use std::marker::PhantomData;

use crate::{DispatchHandle, HandlerError, SmiType};

/// Handler return type
pub type HandlerResult = Result<(), HandlerError>;

/// Details observed when a trigger fired, shared by every handler of one firing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiringDetails<'a> {
    /// Raw status word read from the source
    pub status: u32,

    /// Logical CPU that took the SMI
    pub cpu_index: usize,

    /// Optional communication buffer supplied by the caller of the SMI
    pub comm_buffer: Option<&'a [u8]>,
}

impl<'a> FiringDetails<'a> {
    /// Details with only a status word
    #[inline]
    pub const fn with_status(status: u32) -> Self {
        Self {
            status,
            cpu_index: 0,
            comm_buffer: None,
        }
    }
}

/// One firing as seen by one handler
#[derive(Debug, Clone, Copy)]
pub struct SmiEvent<'a> {
    /// Sub-type that fired
    pub smi_type: SmiType,

    /// Handle of the registration being invoked
    pub handle: DispatchHandle,

    /// Shared firing details
    pub details: FiringDetails<'a>,
}

/// Child dispatch function
///
/// Runs in a restricted context: must not block, must not allocate on the hot
/// path, and must not call back into the dispatcher that invoked it.
pub trait SmiHandler<C>: Send + Sync {
    /// Handle one firing
    fn handle(&self, event: &SmiEvent<'_>, context: &C) -> HandlerResult;
}

/// Adapter turning a closure into an [`SmiHandler`]
pub struct FnHandler<F, C> {
    f: F,
    _context: PhantomData<fn(&C)>,
}

/// Wrap a closure as a handler
///
/// ```
/// use contracts::{handler_fn, SmiHandler};
///
/// let handler = handler_fn(|event, hits: &std::sync::atomic::AtomicU32| {
///     let _ = event.smi_type;
///     hits.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///     Ok(())
/// });
/// # let _: &dyn SmiHandler<std::sync::atomic::AtomicU32> = &handler;
/// ```
pub fn handler_fn<C, F>(f: F) -> FnHandler<F, C>
where
    F: Fn(&SmiEvent<'_>, &C) -> HandlerResult + Send + Sync,
{
    FnHandler {
        f,
        _context: PhantomData,
    }
}

impl<C, F> SmiHandler<C> for FnHandler<F, C>
where
    F: Fn(&SmiEvent<'_>, &C) -> HandlerResult + Send + Sync,
{
    #[inline]
    fn handle(&self, event: &SmiEvent<'_>, context: &C) -> HandlerResult {
        (self.f)(event, context)
    }
}
