//! The bus: subscribe orchestration and publish dispatch.

use std::sync::Arc;

use crate::codec::{FilterRoute, ValueRoute};
use crate::error::BusResult;
use crate::path::FilterPath;

use super::handle::Subscription;
use super::node::Node;
use super::subscription::{IdSource, SubscriptionEnvelope};

/// An in-process publish/subscribe bus for values of type `T`.
///
/// Filters and values are encoded into hashed-segment paths by the type's
/// [`FilterRoute`] and [`ValueRoute`] implementations; the bus routes through
/// a subscription tree in O(path-depth) rather than scanning subscribers.
///
/// All state is volatile: dropping the bus loses every subscription.
#[derive(Debug)]
pub struct PathBus<T> {
    root: Arc<Node<T>>,
}

impl<T> PathBus<T> {
    /// Creates a bus with its own counter-backed id source.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ids(IdSource::new())
    }

    /// Creates a bus around an explicit id source.
    ///
    /// The source is owned by this bus alone, which keeps independent bus
    /// instances isolated and id sequences deterministic in tests.
    #[must_use]
    pub fn with_ids(ids: IdSource) -> Self {
        Self {
            root: Arc::new(Node::new(Arc::new(ids))),
        }
    }

    /// The root node, for diagnostics and tests.
    #[must_use]
    pub fn root(&self) -> &Arc<Node<T>> {
        &self.root
    }

    /// Registers `callback` for every published value matching `filter`.
    ///
    /// The filter's minimized path is created in the tree (walking
    /// `add_child` per segment) and the callback is registered at the
    /// terminal node. An empty path registers at the root and matches every
    /// published value.
    ///
    /// # Errors
    ///
    /// Returns a filter validation error when the filter populates more than
    /// one member of a mutually-exclusive peer set. This marks a logic defect
    /// in the calling code; nothing is registered.
    pub fn subscribe<F, C>(&self, filter: &F, name: &str, callback: C) -> BusResult<Subscription<T>>
    where
        F: FilterRoute + ?Sized,
        C: Fn(&T) + Send + Sync + 'static,
    {
        let path = filter.route()?;
        Ok(self.subscribe_path(path, name, callback))
    }

    /// Registers `callback` at an explicit pre-computed path.
    pub fn subscribe_path<C>(&self, path: FilterPath, name: &str, callback: C) -> Subscription<T>
    where
        C: Fn(&T) + Send + Sync + 'static,
    {
        let mut node = Arc::clone(&self.root);
        for &segment in path.segments() {
            node = node.add_child(segment);
        }
        let id = node.add_subscription(callback, name);
        Subscription::new(Arc::clone(&self.root), path, id, name)
    }

    /// Delivers `value` to every matching subscription, synchronously on the
    /// calling thread. Returns the number of envelopes invoked.
    ///
    /// The walk starts at the root (root-level subscriptions match
    /// everything) and advances one tree level per route step, visiting the
    /// wildcard child alongside the keyed child so subscribers that left a
    /// field unconstrained still match. Matched envelopes are copied out from
    /// under each node's lock before any callback runs, so callbacks may
    /// publish, subscribe, or unsubscribe on this same bus, including on the
    /// nodes being walked.
    pub fn publish(&self, value: &T) -> usize
    where
        T: ValueRoute,
    {
        let mut matched: Vec<SubscriptionEnvelope<T>> = Vec::new();
        self.root.collect_envelopes(&mut matched);

        let mut frontier: Vec<Arc<Node<T>>> = vec![Arc::clone(&self.root)];
        for step in value.route() {
            if frontier.is_empty() {
                break;
            }

            let (wild, keyed) = step.branches();
            let mut next = Vec::with_capacity(frontier.len());
            for node in &frontier {
                if let Some(child) = node.fetch_child(wild) {
                    child.collect_envelopes(&mut matched);
                    next.push(child);
                }
                if let Some(segment) = keyed {
                    if let Some(child) = node.fetch_child(segment) {
                        child.collect_envelopes(&mut matched);
                        next.push(child);
                    }
                }
            }
            frontier = next;
        }

        for envelope in &matched {
            envelope.invoke(value);
        }
        matched.len()
    }
}

impl<T> Default for PathBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
