//! Dispatch metrics for observability

use std::cell::Cell;

/// Counters for a single dispatcher instance.
///
/// Plain `Cell` counters, not atomics: the dispatcher is single-threaded by
/// design and never crosses a thread boundary.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Total dispatches started (successful or not)
    dispatch_count: Cell<u64>,
    /// Total callback invocations across all dispatches
    invocation_count: Cell<u64>,
    /// Total callback invocations that returned an error
    failure_count: Cell<u64>,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total dispatch count
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count.get()
    }

    /// Increment dispatch count
    pub fn inc_dispatch_count(&self) {
        self.dispatch_count.set(self.dispatch_count.get() + 1);
    }

    /// Get total invocation count
    pub fn invocation_count(&self) -> u64 {
        self.invocation_count.get()
    }

    /// Increment invocation count
    pub fn inc_invocation_count(&self) {
        self.invocation_count.set(self.invocation_count.get() + 1);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.get()
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.set(self.failure_count.get() + 1);
    }

    /// Get snapshot of all counters (for reporting)
    pub fn snapshot(&self, registered: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatch_count: self.dispatch_count(),
            invocation_count: self.invocation_count(),
            failure_count: self.failure_count(),
            registered,
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub dispatch_count: u64,
    pub invocation_count: u64,
    pub failure_count: u64,
    /// Callbacks registered at snapshot time
    pub registered: usize,
}
