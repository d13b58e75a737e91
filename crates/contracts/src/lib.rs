//! # Contracts
//!
//! Frozen interface contracts, defining the shared types of the dispatch
//! workspace. All business crates can only depend on this crate, reverse
//! dependencies are prohibited.
//!
//! ## Contents
//! - [`DispatchToken`]: opaque callback handle, minted at registration
//! - [`DispatchError`] / [`DispatchResult`]: unified error surface
//! - [`PayloadSource`] / [`Sourced`]: source-tagged payload envelope

mod error;
mod payload;
mod token;

pub use error::{DispatchError, DispatchResult};
pub use payload::{PayloadSource, Sourced};
pub use token::DispatchToken;
