//! Subscriber-side registration handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::path::FilterPath;

use super::node::Node;
use super::subscription::SubscriptionId;

/// A live registration on a [`PathBus`](super::PathBus).
///
/// Carries everything needed to reverse the subscribe walk: the root
/// reference, the full registration path, and the issued id. Dropping the
/// handle does *not* unregister; subscriptions live until explicitly removed
/// or the bus itself is dropped.
#[derive(Debug)]
pub struct Subscription<T> {
    root: Arc<Node<T>>,
    path: FilterPath,
    id: SubscriptionId,
    name: String,
    removed: AtomicBool,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        root: Arc<Node<T>>,
        path: FilterPath,
        id: SubscriptionId,
        name: &str,
    ) -> Self {
        Self {
            root,
            path,
            id,
            name: name.to_string(),
            removed: AtomicBool::new(false),
        }
    }

    /// The id issued at registration.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The name supplied at registration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The minimized path this subscription was registered at.
    #[must_use]
    pub const fn path(&self) -> &FilterPath {
        &self.path
    }

    /// Removes this subscription from the bus. Idempotent.
    ///
    /// Re-walks the registration path without creating anything and deletes
    /// the id at the terminal node. A missing segment along the way means the
    /// branch was already removed; that is treated as success. Emptied
    /// intermediate nodes are deliberately left in place (pruning is not the
    /// bus's job).
    pub fn unsubscribe(&self) {
        if self.removed.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut node = Some(Arc::clone(&self.root));
        for &segment in self.path.segments() {
            node = Node::fetch_child_of(node.as_ref(), segment);
        }
        if let Some(terminal) = node {
            terminal.delete_subscription(self.id);
        }
    }
}
