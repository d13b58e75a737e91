//! Callback registry - insertion-order table plus the token mint

use std::cell::RefCell;
use std::rc::Rc;

use contracts::{DispatchError, DispatchResult, DispatchToken};

use crate::dispatcher::Dispatcher;

/// Stored form of a registered callback.
///
/// `Rc` so an in-flight invocation survives `unregister`; `RefCell` because
/// callbacks are `FnMut` and the dispatcher hands out `&self` everywhere.
pub(crate) type StoredCallback<P> =
    Rc<RefCell<dyn FnMut(&Dispatcher<P>, &P) -> DispatchResult<()>>>;

struct Entry<P> {
    token: DispatchToken,
    callback: StoredCallback<P>,
}

/// Insertion-order-preserving token -> callback table.
///
/// Backed by a `Vec` so iteration order is registration order, modulo gaps
/// from prior removals. Lookups are linear scans; registries are small and
/// the dispatch loop touches each entry once anyway.
pub(crate) struct Registry<P> {
    entries: Vec<Entry<P>>,
    next_token: u64,
}

impl<P> Registry<P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_token: 0,
        }
    }

    /// Insert a callback under a freshly minted token.
    ///
    /// The counter only ever moves forward, so retired tokens are never
    /// reissued by this registry.
    pub fn insert(&mut self, callback: StoredCallback<P>) -> DispatchToken {
        self.next_token += 1;
        let token = DispatchToken::mint(self.next_token);
        self.entries.push(Entry {
            token: token.clone(),
            callback,
        });
        token
    }

    /// Remove the entry for `token`.
    ///
    /// # Errors
    /// `UnknownToken` if the token has no entry (never issued here, or
    /// already removed).
    pub fn remove(&mut self, token: &DispatchToken) -> DispatchResult<()> {
        let position = self
            .entries
            .iter()
            .position(|entry| &entry.token == token)
            .ok_or_else(|| DispatchError::unknown_token(token.clone()))?;
        self.entries.remove(position);
        Ok(())
    }

    pub fn contains(&self, token: &DispatchToken) -> bool {
        self.entries.iter().any(|entry| &entry.token == token)
    }

    /// Clone out the callback handle for `token`, if registered.
    pub fn get(&self, token: &DispatchToken) -> Option<StoredCallback<P>> {
        self.entries
            .iter()
            .find(|entry| &entry.token == token)
            .map(|entry| Rc::clone(&entry.callback))
    }

    /// Snapshot of all tokens in registration order.
    pub fn tokens(&self) -> Vec<DispatchToken> {
        self.entries.iter().map(|entry| entry.token.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
