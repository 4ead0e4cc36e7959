//! Subscription tree engine.
//!
//! The bus routes published values through a tree of [`Node`]s keyed by
//! hashed path segments. Subscribing creates nodes along a filter's minimized
//! path; publishing walks existing nodes along a value's route, collecting
//! matches at every visited level. Matching is by prefix: a subscription at
//! path `P` receives every value whose route begins with `P`.

/// The bus type and publish dispatch.
pub mod dispatcher;
/// Subscriber-side registration handle.
pub mod handle;
/// Tree vertex and per-node subscription registry.
pub mod node;
/// Subscription ids, id source, and envelopes.
pub mod subscription;

pub use dispatcher::PathBus;
pub use handle::Subscription;
pub use node::Node;
pub use subscription::{Callback, IdSource, SubscriptionEnvelope, SubscriptionId};
