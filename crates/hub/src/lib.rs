//! # Hub
//!
//! Source-tagging wrapper around the dispatcher core.
//!
//! Responsibilities:
//! - Own one [`Dispatcher`] instance (explicitly constructed and passed in
//!   at the composition root, never an implicit global)
//! - Tag payloads with a [`PayloadSource`] marker before dispatching
//! - Defer remote payloads that arrive mid-dispatch until the current
//!   dispatch finishes
//!
//! The hub consumes only `is_dispatching()` and `dispatch()`; all dispatch
//! semantics live in the core.

use std::cell::RefCell;
use std::collections::VecDeque;

use tracing::{debug, instrument, trace};

use contracts::{DispatchResult, DispatchToken};
use dispatcher::Dispatcher;

pub use contracts::{PayloadSource, Sourced};

/// Process-wide dispatch hub.
///
/// Wraps a `Dispatcher<Sourced<P>>` with two entry points: `dispatch_local`
/// for in-process payloads (dispatched immediately) and `dispatch_remote`
/// for externally produced payloads (deferred if a dispatch is already in
/// flight). Deferred payloads run in arrival order, immediately after the
/// dispatch that blocked them returns.
///
/// # Examples
/// ```
/// use hub::Hub;
///
/// let hub: Hub<String> = Hub::new();
/// hub.register(|_, sourced| {
///     println!("[{}] {}", sourced.source, sourced.payload);
///     Ok(())
/// });
/// hub.dispatch_local("refresh".to_string()).unwrap();
/// ```
pub struct Hub<P> {
    dispatcher: Dispatcher<Sourced<P>>,
    deferred: RefCell<VecDeque<Sourced<P>>>,
}

impl<P> Hub<P> {
    /// Create a hub with an empty dispatcher
    pub fn new() -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            deferred: RefCell::new(VecDeque::new()),
        }
    }

    /// Access the wrapped dispatcher (for `wait_for` token plumbing)
    pub fn dispatcher(&self) -> &Dispatcher<Sourced<P>> {
        &self.dispatcher
    }

    /// Register a callback on the wrapped dispatcher
    pub fn register<F>(&self, callback: F) -> DispatchToken
    where
        F: FnMut(&Dispatcher<Sourced<P>>, &Sourced<P>) -> DispatchResult<()> + 'static,
    {
        self.dispatcher.register(callback)
    }

    /// Unregister a callback from the wrapped dispatcher
    ///
    /// # Errors
    /// `UnknownToken` if the token is not currently registered.
    pub fn unregister(&self, token: &DispatchToken) -> DispatchResult<()> {
        self.dispatcher.unregister(token)
    }

    /// Payloads currently parked behind an in-flight dispatch
    pub fn deferred_count(&self) -> usize {
        self.deferred.borrow().len()
    }

    /// Dispatch an in-process payload immediately.
    ///
    /// Tags the payload [`PayloadSource::Local`]. A reentrant call from
    /// inside a callback surfaces `AlreadyDispatching`, same as calling the
    /// dispatcher directly.
    ///
    /// # Errors
    /// Any error from the underlying dispatch, including errors from
    /// deferred payloads drained afterwards.
    #[instrument(name = "hub_dispatch_local", skip(self, payload))]
    pub fn dispatch_local(&self, payload: P) -> DispatchResult<()> {
        self.dispatcher.dispatch(Sourced::local(payload))?;
        self.drain_deferred()
    }

    /// Dispatch an externally produced payload, deferring if necessary.
    ///
    /// Tags the payload [`PayloadSource::Remote`]. If a dispatch is already
    /// in flight the payload is parked and dispatched immediately after the
    /// current dispatch finishes; otherwise it is dispatched right away.
    ///
    /// # Errors
    /// Any error from the underlying dispatch. A deferred payload never
    /// fails at the point of deferral; its dispatch errors surface from the
    /// entry point that drains the queue.
    #[instrument(name = "hub_dispatch_remote", skip(self, payload))]
    pub fn dispatch_remote(&self, payload: P) -> DispatchResult<()> {
        let sourced = Sourced::remote(payload);
        if self.dispatcher.is_dispatching() {
            self.deferred.borrow_mut().push_back(sourced);
            debug!(
                queued = self.deferred.borrow().len(),
                "dispatch in flight, deferring remote payload"
            );
            return Ok(());
        }

        self.dispatcher.dispatch(sourced)?;
        self.drain_deferred()
    }

    /// Dispatch parked payloads in arrival order.
    ///
    /// A failing dispatch stops the drain; the remainder stays queued for
    /// the next entry point.
    fn drain_deferred(&self) -> DispatchResult<()> {
        loop {
            // Pop before dispatching: the callbacks may defer more payloads,
            // and the queue borrow must not be held across the dispatch.
            let next = self.deferred.borrow_mut().pop_front();
            match next {
                None => return Ok(()),
                Some(sourced) => {
                    trace!(source = %sourced.source, "dispatching deferred payload");
                    self.dispatcher.dispatch(sourced)?;
                }
            }
        }
    }
}

impl<P> Default for Hub<P> {
    fn default() -> Self {
        Self::new()
    }
}
