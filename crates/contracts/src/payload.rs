//! Sourced payload envelope
//!
//! Types used by the hub wrapper to tag payloads with where they came from
//! before handing them to the dispatcher. The dispatcher itself is agnostic:
//! every callback sees every payload regardless of source.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin marker stamped onto a payload by the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSource {
    /// Produced in-process (dispatched immediately)
    Local,
    /// Produced by an external party (deferred if a dispatch is in flight)
    Remote,
}

impl fmt::Display for PayloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// A payload tagged with its source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sourced<P> {
    pub source: PayloadSource,
    pub payload: P,
}

impl<P> Sourced<P> {
    /// Tag a payload as locally produced
    pub fn local(payload: P) -> Self {
        Self {
            source: PayloadSource::Local,
            payload,
        }
    }

    /// Tag a payload as remotely produced
    pub fn remote(payload: P) -> Self {
        Self {
            source: PayloadSource::Remote,
            payload,
        }
    }
}
