//! Subscription identity and envelope types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Unique identifier for a subscription.
///
/// Generated once per subscribe call by the bus's [`IdSource`], never reused,
/// and only meaningful within the node it was registered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wraps a raw id value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Thread-safe source of unique subscription ids.
///
/// Each bus owns its own source (injected at construction, shared with every
/// node), so independent bus instances issue ids independently and tests stay
/// deterministic. Ids are a monotonically increasing counter starting at 1.
#[derive(Debug)]
pub struct IdSource {
    next: AtomicU64,
}

impl IdSource {
    /// Creates a source starting at id 1.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a source whose first issued id is `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Issues a fresh id, distinct from every id previously issued by this
    /// source.
    pub fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The callback invoked for each delivered value.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A stored callback plus the name supplied at registration.
///
/// Envelopes are owned by the node they were registered at. One subscription
/// id maps to an ordered list of envelopes; delivery broadcasts to every
/// envelope in the list, and `name` is a diagnostic tag only.
pub struct SubscriptionEnvelope<T> {
    callback: Callback<T>,
    name: Arc<str>,
}

impl<T> SubscriptionEnvelope<T> {
    /// Wraps a callback and its registration name.
    pub fn new<C>(callback: C, name: &str) -> Self
    where
        C: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            name: Arc::from(name),
        }
    }

    /// The name supplied at registration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the stored callback with a delivered value.
    pub fn invoke(&self, value: &T) {
        (self.callback)(value);
    }
}

impl<T> Clone for SubscriptionEnvelope<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
            name: Arc::clone(&self.name),
        }
    }
}

impl<T> fmt::Debug for SubscriptionEnvelope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionEnvelope")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_ids_are_unique_and_monotonic() {
        let ids = IdSource::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_sources_are_independent() {
        let first = IdSource::new();
        let second = IdSource::new();
        assert_eq!(first.next_id(), second.next_id());
    }

    #[test]
    fn test_starting_at() {
        let ids = IdSource::starting_at(100);
        assert_eq!(ids.next_id(), SubscriptionId::from_raw(100));
    }

    #[test]
    fn test_display() {
        assert_eq!(SubscriptionId::from_raw(7).to_string(), "sub-7");
    }

    #[test]
    fn test_envelope_invokes_callback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&hits);
        let envelope = SubscriptionEnvelope::new(
            move |_value: &u32| {
                counted.fetch_add(1, Ordering::SeqCst);
            },
            "audit",
        );
        envelope.invoke(&5);
        let copy = envelope.clone();
        copy.invoke(&6);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(copy.name(), "audit");
    }
}
