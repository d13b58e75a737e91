//! # Dispatcher
//!
//! Synchronous in-process broadcast core.
//!
//! Responsibilities:
//! - Hold the callback registry and mint [`DispatchToken`]s
//! - Deliver each payload to every registered callback, in registration order
//! - Let callbacks pull dependencies forward with `wait_for`, with cycle and
//!   reentrancy guards

pub mod dispatcher;
pub mod metrics;
mod registry;

pub use contracts::{DispatchError, DispatchResult, DispatchToken};
pub use dispatcher::Dispatcher;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
