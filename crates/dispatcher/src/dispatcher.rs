//! Dispatcher - synchronous broadcast loop with caller-declared ordering

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, instrument, trace};

use contracts::{DispatchError, DispatchResult, DispatchToken};

use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::registry::{Registry, StoredCallback};

/// Per-dispatch bookkeeping.
///
/// Exists exactly while a dispatch is in flight; `Dispatcher::run` being
/// `Some` *is* the dispatching flag.
struct DispatchRun<P> {
    /// true once a callback's invocation has started (including in-progress)
    pending: HashMap<DispatchToken, bool>,
    /// true once a callback's invocation has completed without error
    handled: HashMap<DispatchToken, bool>,
    /// Payload for this dispatch, shared with every nested invocation
    payload: Rc<P>,
}

/// Where a `wait_for` target stands in the current dispatch
enum WaitState {
    /// Already ran to completion: waiting is a no-op
    Completed,
    /// Started but not finished: the wait chain loops back on itself
    Running,
    /// Not started yet: invoke it now
    Fresh,
}

/// Synchronous in-process broadcast dispatcher.
///
/// Delivers each dispatched payload to every registered callback, in
/// registration order unless a callback pulls another forward with
/// [`wait_for`](Self::wait_for). All control flow is synchronous and
/// single-threaded: `wait_for` grows the call stack instead of yielding to
/// a scheduler, which is what makes the per-dispatch ordering guarantee
/// exact.
///
/// Callbacks receive `&Dispatcher<P>` so they can re-enter `wait_for` (and
/// `register`/`unregister`) mid-dispatch; every method therefore takes
/// `&self` and state lives behind `RefCell`. The instance is not `Sync` and
/// is meant for a single logical thread of control.
///
/// # Examples
/// ```
/// use dispatcher::Dispatcher;
///
/// let dispatcher: Dispatcher<String> = Dispatcher::new();
/// let token = dispatcher.register(|_, payload: &String| {
///     println!("got {payload}");
///     Ok(())
/// });
/// dispatcher.dispatch("hello".to_string()).unwrap();
/// dispatcher.unregister(&token).unwrap();
/// ```
pub struct Dispatcher<P> {
    registry: RefCell<Registry<P>>,
    run: RefCell<Option<DispatchRun<P>>>,
    metrics: DispatchMetrics,
}

/// Clears per-dispatch bookkeeping when the dispatch frame unwinds,
/// normally or on error.
struct CleanupGuard<'a, P>(&'a Dispatcher<P>);

impl<P> Drop for CleanupGuard<'_, P> {
    fn drop(&mut self) {
        *self.0.run.borrow_mut() = None;
    }
}

impl<P> Dispatcher<P> {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(Registry::new()),
            run: RefCell::new(None),
            metrics: DispatchMetrics::new(),
        }
    }

    /// Register a callback to receive every dispatched payload.
    ///
    /// Returns the token identifying this registration. Registering the
    /// same logic twice yields two independent tokens.
    pub fn register<F>(&self, callback: F) -> DispatchToken
    where
        F: FnMut(&Dispatcher<P>, &P) -> DispatchResult<()> + 'static,
    {
        let stored: StoredCallback<P> = Rc::new(RefCell::new(callback));
        let token = self.registry.borrow_mut().insert(stored);
        debug!(token = %token, "callback registered");
        token
    }

    /// Remove a registered callback.
    ///
    /// Allowed during an active dispatch: an in-flight invocation of the
    /// removed callback still runs to completion, and a removed callback
    /// that had not started yet is skipped by the rest of the dispatch.
    ///
    /// # Errors
    /// `UnknownToken` if the token is not currently registered.
    pub fn unregister(&self, token: &DispatchToken) -> DispatchResult<()> {
        self.registry.borrow_mut().remove(token)?;
        debug!(token = %token, "callback unregistered");
        Ok(())
    }

    /// Whether a dispatch is currently in flight
    pub fn is_dispatching(&self) -> bool {
        self.run.borrow().is_some()
    }

    /// Number of currently registered callbacks
    pub fn callback_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Get current metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.callback_count())
    }

    /// Run the callbacks named by `tokens` to completion before returning.
    ///
    /// Callable only from inside a callback during an active dispatch. For
    /// each token in order: already-completed targets are skipped,
    /// still-running targets are a wait cycle, everything else is invoked
    /// synchronously right here (recursively, so the target may itself
    /// `wait_for` others).
    ///
    /// # Errors
    /// - `NotDispatching` outside an active dispatch
    /// - `CircularDependency` if a target is started but not finished
    /// - `UnknownToken` if a target is not registered
    /// - Any error propagating out of an invoked callback
    #[instrument(name = "wait_for", skip(self, tokens), fields(waiting = tokens.len()))]
    pub fn wait_for(&self, tokens: &[DispatchToken]) -> DispatchResult<()> {
        for token in tokens {
            match self.wait_state(token)? {
                WaitState::Completed => {
                    trace!(token = %token, "already handled, skipping");
                }
                WaitState::Running => {
                    return Err(DispatchError::circular_dependency(token.clone()));
                }
                WaitState::Fresh => {
                    if !self.registry.borrow().contains(token) {
                        return Err(DispatchError::unknown_token(token.clone()));
                    }
                    trace!(token = %token, "pulling callback forward");
                    self.invoke(token)?;
                }
            }
        }
        Ok(())
    }

    /// Deliver `payload` to every registered callback, in registration
    /// order unless reordered by `wait_for`.
    ///
    /// Bookkeeping is cleared on every exit path, so the dispatcher is
    /// dispatch-ready again even after a failure; the next dispatch starts
    /// a fresh full pass over all currently registered callbacks.
    ///
    /// # Errors
    /// - `AlreadyDispatching` on a reentrant call
    /// - The first error escaping a callback (including `wait_for`
    ///   validation failures), unwound through all nested invocations
    #[instrument(name = "dispatch", skip(self, payload), fields(callbacks = self.callback_count()))]
    pub fn dispatch(&self, payload: P) -> DispatchResult<()> {
        let order = self.begin(payload)?;
        self.metrics.inc_dispatch_count();
        let _cleanup = CleanupGuard(self);

        for token in &order {
            if self.is_started(token) {
                // Already pulled forward by an earlier callback's wait_for
                continue;
            }
            if !self.registry.borrow().contains(token) {
                trace!(token = %token, "unregistered mid-dispatch, skipping");
                continue;
            }
            self.invoke(token)?;
        }

        debug!(callbacks = order.len(), "dispatch complete");
        Ok(())
    }

    /// Start a dispatch: guard against reentry, reset bookkeeping over the
    /// current registry, and return the registration-order snapshot to
    /// iterate. Callbacks registered after this point are not part of the
    /// loop (though `wait_for` can still reach them).
    fn begin(&self, payload: P) -> DispatchResult<Vec<DispatchToken>> {
        let mut run = self.run.borrow_mut();
        if run.is_some() {
            return Err(DispatchError::AlreadyDispatching);
        }

        let order = self.registry.borrow().tokens();
        *run = Some(DispatchRun {
            pending: order.iter().map(|t| (t.clone(), false)).collect(),
            handled: order.iter().map(|t| (t.clone(), false)).collect(),
            payload: Rc::new(payload),
        });
        Ok(order)
    }

    /// Whether the token's invocation has started in the current dispatch
    fn is_started(&self, token: &DispatchToken) -> bool {
        self.run
            .borrow()
            .as_ref()
            .is_some_and(|run| run.pending.get(token).copied().unwrap_or(false))
    }

    /// Classify a `wait_for` target against the current bookkeeping
    fn wait_state(&self, token: &DispatchToken) -> DispatchResult<WaitState> {
        let run = self.run.borrow();
        let run = run.as_ref().ok_or(DispatchError::NotDispatching)?;

        if run.pending.get(token).copied().unwrap_or(false) {
            if run.handled.get(token).copied().unwrap_or(false) {
                Ok(WaitState::Completed)
            } else {
                Ok(WaitState::Running)
            }
        } else {
            Ok(WaitState::Fresh)
        }
    }

    /// Shared invocation path for the dispatch loop and `wait_for`.
    ///
    /// Marks the token pending before the call (so cycles are caught and
    /// the callback cell is never re-borrowed) and handled only after the
    /// callback returns `Ok`. On error the token stays pending-without-
    /// handled for the remainder of the failed dispatch.
    fn invoke(&self, token: &DispatchToken) -> DispatchResult<()> {
        let callback = self
            .registry
            .borrow()
            .get(token)
            .ok_or_else(|| DispatchError::unknown_token(token.clone()))?;

        let payload = {
            let mut run = self.run.borrow_mut();
            let run = run.as_mut().ok_or(DispatchError::NotDispatching)?;
            run.pending.insert(token.clone(), true);
            Rc::clone(&run.payload)
        };

        // All RefCell borrows are released here: the callback is free to
        // re-enter through the dispatcher reference it receives.
        self.metrics.inc_invocation_count();
        trace!(token = %token, "invoking callback");
        let result = match (&mut *callback.borrow_mut())(self, &payload) {
            Ok(()) => {
                if let Some(run) = self.run.borrow_mut().as_mut() {
                    run.handled.insert(token.clone(), true);
                }
                Ok(())
            }
            Err(e) => {
                self.metrics.inc_failure_count();
                Err(e)
            }
        };
        result
    }
}

impl<P> Default for Dispatcher<P> {
    fn default() -> Self {
        Self::new()
    }
}
