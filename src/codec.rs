//! Structural hashing and the two route contracts.
//!
//! The bus never reflects over published values. Instead, each routed type
//! supplies two pure encodings:
//!
//! - [`FilterRoute`]: a subscriber filter becomes a minimized [`FilterPath`],
//!   one segment per declared constraint level (hash when set, wildcard `0`
//!   when unset).
//! - [`ValueRoute`]: a published value becomes a lazy sequence of [`Step`]s,
//!   one per level, produced on demand while the dispatcher walks the tree.
//!
//! Both encodings must visit fields in the same declared order, and variant
//! tags must be assigned from a deterministic ordering of the alternatives
//! (lexicographic by name is the convention) so that a given alternative maps
//! to the same tag across builds and processes.
//!
//! Implementations can be hand-written against [`PathBuilder`] and [`Step`],
//! derived, or emitted by a generator; the engine depends only on this
//! module's contracts.
//!
//! ## Hashing
//!
//! Scalars are keyed by a blake3 digest of their byte representation,
//! truncated to 64 bits, which is stable across runs and processes. Booleans
//! encode as raw `0`/`1` rather than being hashed, which means `false` is
//! indistinguishable from "unset". Collisions between distinct scalar values
//! (including a digest that happens to land on the reserved `0`) are not
//! detected or resolved; the bus trades perfect precision for never having to
//! retain raw values as tree keys.

use crate::error::FilterError;
use crate::path::{FilterPath, Segment, WILDCARD};

/// Hashes a byte representation into a path segment.
///
/// Stable across runs: the same bytes always produce the same segment.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> Segment {
    let digest = blake3::hash(data);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// A scalar that can be keyed into a path segment.
pub trait RouteKey {
    /// The segment keying this scalar value.
    fn route_key(&self) -> Segment;
}

impl RouteKey for str {
    fn route_key(&self) -> Segment {
        hash_bytes(self.as_bytes())
    }
}

impl RouteKey for String {
    fn route_key(&self) -> Segment {
        hash_bytes(self.as_bytes())
    }
}

impl RouteKey for [u8] {
    fn route_key(&self) -> Segment {
        hash_bytes(self)
    }
}

impl RouteKey for bool {
    /// Booleans encode as raw `0`/`1`, so `false` collides with the wildcard
    /// marker. An accepted approximation of the 0/1 encoding.
    fn route_key(&self) -> Segment {
        Segment::from(*self)
    }
}

macro_rules! impl_route_key_int {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl RouteKey for $ty {
                fn route_key(&self) -> Segment {
                    hash_bytes(&self.to_le_bytes())
                }
            }
        )+
    };
}

impl_route_key_int!(u16, u32, u64, i16, i32, i64);

impl RouteKey for f64 {
    fn route_key(&self) -> Segment {
        hash_bytes(&self.to_bits().to_le_bytes())
    }
}

impl RouteKey for f32 {
    fn route_key(&self) -> Segment {
        hash_bytes(&self.to_bits().to_le_bytes())
    }
}

impl<K: RouteKey + ?Sized> RouteKey for &K {
    fn route_key(&self) -> Segment {
        (**self).route_key()
    }
}

/// Encodes a filter into a minimized path.
///
/// Implementations append one segment per declared constraint level through a
/// [`PathBuilder`], in the same order the matching [`ValueRoute`] emits its
/// steps.
pub trait FilterRoute {
    /// Appends this filter's unminimized segment body to `builder`.
    ///
    /// Nested filters are encoded through this method so that only the
    /// outermost path gets minimized.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::AmbiguousPeers`] when more than one member of a
    /// mutually-exclusive peer set is populated.
    fn route_into(&self, builder: &mut PathBuilder) -> Result<(), FilterError>;

    /// Encodes this filter into its minimized path.
    ///
    /// # Errors
    ///
    /// Propagates any validation failure from [`FilterRoute::route_into`].
    fn route(&self) -> Result<FilterPath, FilterError> {
        let mut builder = PathBuilder::new();
        self.route_into(&mut builder)?;
        Ok(builder.finish())
    }
}

/// Accumulates a filter's segment sequence.
///
/// `scalar` appends the hash of a set constraint or the wildcard marker for
/// an unset one; `peer_group` opens a mutually-exclusive set of sub-filters;
/// `variant` appends an enum alternative's reserved tag followed by its
/// sub-path. `finish` minimizes the accumulated path.
#[derive(Debug, Default)]
pub struct PathBuilder {
    path: FilterPath,
}

impl PathBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one scalar constraint level: the value's key when set, the
    /// wildcard marker when unset.
    pub fn scalar<K: RouteKey + ?Sized>(&mut self, value: Option<&K>) -> &mut Self {
        match value {
            Some(v) => self.path.push(v.route_key()),
            None => self.path.push(WILDCARD),
        }
        self
    }

    /// Appends a raw segment. Escape hatch for pre-computed keys.
    pub fn segment(&mut self, segment: Segment) -> &mut Self {
        self.path.push(segment);
        self
    }

    /// Opens a mutually-exclusive peer group named `group`.
    ///
    /// Feed every member through [`PeerGroup::alternative`]; the populated
    /// one contributes its reserved tag followed by its sub-path, and a
    /// second populated member fails the whole encoding.
    pub fn peer_group(&mut self, group: &'static str) -> PeerGroup<'_> {
        PeerGroup {
            builder: self,
            group,
            populated: 0,
        }
    }

    /// Appends a polymorphic alternative: its reserved tag, then its
    /// sub-path.
    ///
    /// Tags start at 1 (`0` is the wildcard marker) and must come from a
    /// deterministic ordering of the alternatives.
    ///
    /// # Errors
    ///
    /// Propagates validation failures from the alternative's sub-filter.
    pub fn variant<F: FilterRoute>(
        &mut self,
        tag: Segment,
        sub: &F,
    ) -> Result<&mut Self, FilterError> {
        self.path.push(tag);
        sub.route_into(self)?;
        Ok(self)
    }

    /// Minimizes and returns the accumulated path.
    #[must_use]
    pub fn finish(self) -> FilterPath {
        self.path.minimized()
    }
}

/// An open mutually-exclusive peer set on a [`PathBuilder`].
#[derive(Debug)]
pub struct PeerGroup<'a> {
    builder: &'a mut PathBuilder,
    group: &'static str,
    populated: usize,
}

impl PeerGroup<'_> {
    /// Declares one member of the peer set.
    ///
    /// An unpopulated member (`None`) contributes nothing. A populated one
    /// appends its reserved tag followed by its sub-path.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::AmbiguousPeers`] as soon as a second member of
    /// this group is found populated.
    pub fn alternative<F: FilterRoute>(
        &mut self,
        tag: Segment,
        member: Option<&F>,
    ) -> Result<&mut Self, FilterError> {
        if let Some(sub) = member {
            self.populated += 1;
            if self.populated > 1 {
                return Err(FilterError::AmbiguousPeers {
                    group: self.group,
                    populated: self.populated,
                });
            }
            self.builder.variant(tag, sub)?;
        }
        Ok(self)
    }
}

/// One level of a published value's route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The field at this level is absent: only the wildcard branch exists.
    Unset,
    /// The field is present: subscribers may have constrained it (hashed
    /// branch) or left it open (wildcard branch), so the walk tries both.
    Key(Segment),
    /// A variant tag level: exactly one branch, no wildcard. Filters that do
    /// not constrain the variant end before this level and already matched
    /// by prefix.
    Tag(Segment),
}

impl Step {
    /// Builds the step for an optional scalar field.
    pub fn key<K: RouteKey + ?Sized>(value: Option<&K>) -> Self {
        match value {
            Some(v) => Self::Key(v.route_key()),
            None => Self::Unset,
        }
    }

    /// The child segments the dispatcher tries at this level, wildcard
    /// branch first. A keyed segment that collided with the wildcard marker
    /// collapses to the single wildcard branch.
    #[must_use]
    pub fn branches(&self) -> (Segment, Option<Segment>) {
        match *self {
            Self::Unset | Self::Key(WILDCARD) => (WILDCARD, None),
            Self::Key(segment) => (WILDCARD, Some(segment)),
            Self::Tag(segment) => (segment, None),
        }
    }
}

/// Lazily produced route of a published value, one [`Step`] per level.
pub type ValuePath<'a> = Box<dyn Iterator<Item = Step> + 'a>;

/// Encodes a published value into its lazy per-level route.
///
/// The route mirrors the field order of the type's [`FilterRoute`] encoding
/// and terminates by iterator exhaustion; absent sub-structures may cut the
/// route short, which the prefix-walk tolerates.
pub trait ValueRoute {
    /// The per-level route of this value.
    fn route(&self) -> ValuePath<'_>;
}
