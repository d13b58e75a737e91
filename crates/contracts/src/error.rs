//! Dispatch error definitions
//!
//! Every failure is synchronous and surfaces directly to the caller of the
//! operation that triggered it; nothing is caught or retried internally.

use thiserror::Error;

use crate::DispatchToken;

/// Unified error type for dispatch operations
#[derive(Debug, Error)]
pub enum DispatchError {
    /// `dispatch` called while another dispatch is still in flight
    #[error("dispatch called while another dispatch is in progress")]
    AlreadyDispatching,

    /// `wait_for` called outside of an active dispatch
    #[error("wait_for called outside of an active dispatch")]
    NotDispatching,

    /// Token has no registry entry (never issued, or already unregistered)
    #[error("unknown dispatch token: {token}")]
    UnknownToken { token: DispatchToken },

    /// `wait_for` target is pending but not yet handled: a wait cycle
    #[error("circular dependency while waiting for token {token}")]
    CircularDependency { token: DispatchToken },

    /// Arbitrary error escaping a registered callback
    #[error("callback error: {0}")]
    Callback(#[from] anyhow::Error),
}

impl DispatchError {
    /// Create an unknown-token error
    pub fn unknown_token(token: DispatchToken) -> Self {
        Self::UnknownToken { token }
    }

    /// Create a circular-dependency error
    pub fn circular_dependency(token: DispatchToken) -> Self {
        Self::CircularDependency { token }
    }

    /// Create a callback error from a plain message
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(anyhow::anyhow!(message.into()))
    }
}

/// Result type alias for dispatch operations
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
