//! Subscription tree vertex.
//!
//! Each node owns its children (keyed by path segment) and a local registry
//! of subscription envelopes, each behind its own lock. There is no global
//! lock: operations on disjoint branches never contend, and no node holds a
//! reference back to its parent.
//!
//! Absence is never an error. Every read on a node reference that does not
//! exist behaves exactly like the same read on an existing empty node; the
//! `*_of` helpers make that explicit for `Option`-shaped handles.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::path::Segment;

use super::subscription::{IdSource, SubscriptionEnvelope, SubscriptionId};

/// A vertex of the subscription tree.
///
/// Children are created on first need during subscribe and are never pruned
/// automatically; a node dies only when its owning parent deletes it, taking
/// the whole subtree with it.
#[derive(Debug)]
pub struct Node<T> {
    children: RwLock<HashMap<Segment, Arc<Node<T>>>>,
    bindings: RwLock<HashMap<SubscriptionId, Vec<SubscriptionEnvelope<T>>>>,
    ids: Arc<IdSource>,
}

impl<T> Node<T> {
    pub(crate) fn new(ids: Arc<IdSource>) -> Self {
        Self {
            children: RwLock::new(HashMap::new()),
            bindings: RwLock::new(HashMap::new()),
            ids,
        }
    }

    // Locks are held only around map operations and never across callback
    // invocations, so a poisoned lock can only mean a panic inside std's map
    // code; recover the guard rather than failing infallible reads.
    fn children_read(&self) -> RwLockReadGuard<'_, HashMap<Segment, Arc<Node<T>>>> {
        self.children.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn children_write(&self) -> RwLockWriteGuard<'_, HashMap<Segment, Arc<Node<T>>>> {
        self.children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn bindings_read(
        &self,
    ) -> RwLockReadGuard<'_, HashMap<SubscriptionId, Vec<SubscriptionEnvelope<T>>>> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn bindings_write(
        &self,
    ) -> RwLockWriteGuard<'_, HashMap<SubscriptionId, Vec<SubscriptionEnvelope<T>>>> {
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up the child for `key`. No side effect.
    #[must_use]
    pub fn fetch_child(&self, key: Segment) -> Option<Arc<Node<T>>> {
        self.children_read().get(&key).map(Arc::clone)
    }

    /// Returns the child for `key`, creating it first if absent.
    ///
    /// Idempotent per key: repeated calls yield the same child.
    pub fn add_child(&self, key: Segment) -> Arc<Node<T>> {
        if let Some(existing) = self.fetch_child(key) {
            return existing;
        }

        let mut children = self.children_write();
        // A racing subscriber may have created it between the two locks.
        Arc::clone(
            children
                .entry(key)
                .or_insert_with(|| Arc::new(Self::new(Arc::clone(&self.ids)))),
        )
    }

    /// Removes the child for `key` and its entire subtree. No-op if absent.
    pub fn delete_child(&self, key: Segment) {
        self.children_write().remove(&key);
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children_read().len()
    }

    /// Registers a callback at this node under a fresh unique id.
    ///
    /// The node participates in dispatch for this id from now on. `name` is a
    /// diagnostic tag and does not affect delivery.
    pub fn add_subscription<C>(&self, callback: C, name: &str) -> SubscriptionId
    where
        C: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.ids.next_id();
        self.bindings_write()
            .insert(id, vec![SubscriptionEnvelope::new(callback, name)]);
        id
    }

    /// Appends another delivery target under an existing id.
    ///
    /// Used when combined filters converge on the same node so one logical
    /// subscription carries several envelopes. Creates the id if unknown.
    pub fn add_envelope<C>(&self, id: SubscriptionId, callback: C, name: &str)
    where
        C: Fn(&T) + Send + Sync + 'static,
    {
        self.bindings_write()
            .entry(id)
            .or_default()
            .push(SubscriptionEnvelope::new(callback, name));
    }

    /// Removes every envelope registered under `id` at this node. No-op if
    /// the id is unknown.
    pub fn delete_subscription(&self, id: SubscriptionId) {
        self.bindings_write().remove(&id);
    }

    /// Number of distinct subscription ids registered directly at this node.
    /// Children are not counted.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.bindings_read().len()
    }

    /// Visits a defensive snapshot of the id-to-envelope mapping.
    ///
    /// Envelope order within a list is insertion order; iteration order
    /// across ids is unspecified. The snapshot is cloned out under the read
    /// lock before `visit` runs, so the visitor may freely mutate this node.
    pub fn for_each_subscription<V>(&self, mut visit: V)
    where
        V: FnMut(SubscriptionId, &[SubscriptionEnvelope<T>]),
    {
        let snapshot: Vec<(SubscriptionId, Vec<SubscriptionEnvelope<T>>)> = self
            .bindings_read()
            .iter()
            .map(|(id, envelopes)| (*id, envelopes.clone()))
            .collect();

        for (id, envelopes) in &snapshot {
            visit(*id, envelopes);
        }
    }

    /// Copies every envelope at this node into `out`, releasing the lock
    /// before the caller invokes anything.
    pub(crate) fn collect_envelopes(&self, out: &mut Vec<SubscriptionEnvelope<T>>) {
        for envelopes in self.bindings_read().values() {
            out.extend(envelopes.iter().cloned());
        }
    }

    /// `fetch_child` against a possibly-absent node: an absent node has no
    /// children.
    #[must_use]
    pub fn fetch_child_of(node: Option<&Arc<Node<T>>>, key: Segment) -> Option<Arc<Node<T>>> {
        node.and_then(|n| n.fetch_child(key))
    }

    /// `child_count` against a possibly-absent node.
    #[must_use]
    pub fn child_count_of(node: Option<&Arc<Node<T>>>) -> usize {
        node.map_or(0, |n| n.child_count())
    }

    /// `subscription_count` against a possibly-absent node.
    #[must_use]
    pub fn subscription_count_of(node: Option<&Arc<Node<T>>>) -> usize {
        node.map_or(0, |n| n.subscription_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_node() -> Node<u64> {
        Node::new(Arc::new(IdSource::new()))
    }

    #[test]
    fn test_absent_node_reads_match_empty_node() {
        let node = Arc::new(empty_node());
        let absent: Option<&Arc<Node<u64>>> = None;

        assert!(Node::fetch_child_of(absent, 99).is_none());
        assert!(Node::fetch_child_of(Some(&node), 99).is_none());
        assert_eq!(Node::child_count_of(absent), Node::child_count_of(Some(&node)));
        assert_eq!(
            Node::subscription_count_of(absent),
            Node::subscription_count_of(Some(&node))
        );
    }

    #[test]
    fn test_fetch_unknown_child_is_none() {
        let node = empty_node();
        assert!(node.fetch_child(99).is_none());
    }

    #[test]
    fn test_add_child_is_idempotent() {
        let node = empty_node();
        let first = node.add_child(1);
        let second = node.add_child(1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(node.child_count(), 1);

        let fetched = node.fetch_child(1).unwrap();
        assert!(Arc::ptr_eq(&first, &fetched));
    }

    #[test]
    fn test_delete_child_removes_subtree() {
        let node = empty_node();
        let child = node.add_child(1);
        child.add_child(2);
        node.add_child(3);
        assert_eq!(node.child_count(), 2);

        node.delete_child(1);
        assert_eq!(node.child_count(), 1);
        assert!(node.fetch_child(1).is_none());

        // Deleting an absent key is a no-op.
        node.delete_child(1);
        assert_eq!(node.child_count(), 1);
    }

    #[test]
    fn test_subscription_ids_are_distinct() {
        let node = empty_node();
        let a = node.add_subscription(|_| {}, "same");
        let b = node.add_subscription(|_| {}, "same");
        assert_ne!(a, b);
        assert_eq!(node.subscription_count(), 2);
    }

    #[test]
    fn test_delete_leaves_other_subscriptions() {
        let node = empty_node();
        let first = node.add_subscription(|_| {}, "");
        node.add_subscription(|_| {}, "");
        node.add_subscription(|_| {}, "");
        node.delete_subscription(first);

        let mut envelopes = 0;
        node.for_each_subscription(|_, list| envelopes += list.len());
        assert_eq!(envelopes, 2);
        assert_eq!(node.subscription_count(), 2);

        // Unknown id delete is a no-op.
        node.delete_subscription(first);
        assert_eq!(node.subscription_count(), 2);
    }

    #[test]
    fn test_add_envelope_groups_under_one_id() {
        let node = empty_node();
        let id = node.add_subscription(|_| {}, "primary");
        node.add_envelope(id, |_| {}, "secondary");

        assert_eq!(node.subscription_count(), 1);
        let mut names = Vec::new();
        node.for_each_subscription(|seen, list| {
            assert_eq!(seen, id);
            names.extend(list.iter().map(|e| e.name().to_string()));
        });
        // Envelope order within an id is insertion order.
        assert_eq!(names, vec!["primary", "secondary"]);
    }

    #[test]
    fn test_visitor_may_mutate_node() {
        let node = empty_node();
        let id = node.add_subscription(|_| {}, "");
        node.for_each_subscription(|seen, _| {
            // Snapshot iteration: mutation under the visitor must not deadlock.
            node.delete_subscription(seen);
        });
        assert_eq!(node.subscription_count(), 0);
        node.delete_subscription(id);
    }
}
