//! DispatchToken - Cheap-to-clone callback handle
//!
//! Uses Arc<str> internally for O(1) clone operations.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Opaque handle for a registered callback.
///
/// Internally uses `Arc<str>` so cloning only increments a reference count
/// instead of allocating new memory. Tokens are minted once at registration
/// time and cloned freely afterwards (into pending/handled maps, `wait_for`
/// lists, error values).
///
/// Tokens are minted from a per-dispatcher monotonically increasing counter
/// and are never reused within one dispatcher's lifetime. Treat the value as
/// opaque: the only supported uses are `wait_for` and `unregister` against
/// the dispatcher that issued it.
///
/// # Examples
/// ```
/// use contracts::DispatchToken;
///
/// let token = DispatchToken::mint(1);
/// let token2 = token.clone(); // O(1) - just increments ref count
/// assert_eq!(token, token2);
/// assert_eq!(token.as_str(), "ID_1");
/// ```
#[derive(Clone)]
pub struct DispatchToken(Arc<str>);

impl DispatchToken {
    /// Mint a token from a counter value.
    ///
    /// Called by the dispatcher's registry; counter values must be unique
    /// per dispatcher instance.
    #[inline]
    pub fn mint(index: u64) -> Self {
        Self(Arc::from(format!("ID_{index}").as_str()))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DispatchToken {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Display and Debug
impl fmt::Display for DispatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DispatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DispatchToken({:?})", self.0)
    }
}

// Equality - can compare with &str as well
impl PartialEq for DispatchToken {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for DispatchToken {}

impl PartialEq<str> for DispatchToken {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for DispatchToken {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

// Hash - same as str hash for HashMap compatibility
impl Hash for DispatchToken {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}
