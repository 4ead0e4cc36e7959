//! # pathbus - structural pub/sub without per-publish reflection
//!
//! pathbus is an in-process publish/subscribe bus that routes arbitrarily
//! structured values to interested subscribers using structural filter
//! criteria. Both subscriber filters and published values are encoded into
//! sequences of 64-bit hashed path segments, so dispatch walks a subscription
//! tree in O(path-depth) instead of scanning every subscriber.
//!
//! ## Core Concepts
//!
//! - **Segment**: a 64-bit hashed key; `0` is the reserved wildcard marker
//! - **FilterPath**: a filter's minimized segment sequence (trailing
//!   wildcards trimmed)
//! - **Node**: a tree vertex owning children and a local subscription
//!   registry
//! - **Prefix match**: a subscription at path `P` receives every value whose
//!   route begins with `P`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pathbus::{PathBus, FilterRoute, ValueRoute, PathBuilder, Step};
//!
//! let bus: PathBus<Envelope> = PathBus::new();
//!
//! // Deliver every envelope from source "router" to the audit callback.
//! let sub = bus.subscribe(
//!     &EnvelopeFilter { source: Some("router".into()), ..Default::default() },
//!     "audit",
//!     |envelope| println!("matched: {envelope:?}"),
//! )?;
//!
//! bus.publish(&Envelope::log("router", "starting up"));
//! sub.unsubscribe();
//! ```
//!
//! Hash collisions between distinct scalar values are silently accepted;
//! delivery is synchronous on the publishing thread; all state is volatile.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bus;
pub mod codec;
pub mod error;
pub mod path;

// Re-export primary types at crate root for convenience
pub use bus::{Callback, IdSource, Node, PathBus, Subscription, SubscriptionEnvelope, SubscriptionId};
pub use codec::{hash_bytes, FilterRoute, PathBuilder, PeerGroup, RouteKey, Step, ValuePath, ValueRoute};
pub use error::{BusError, BusResult, FilterError};
pub use path::{FilterPath, Segment, WILDCARD};
