//! Path segments and filter paths.
//!
//! A path is an ordered sequence of 64-bit segments. Each segment is either a
//! hashed scalar key, a variant tag, or the reserved wildcard marker `0`
//! meaning "unconstrained". Filter paths are *minimized*: trailing wildcard
//! segments are trimmed so a broader filter occupies a shorter path in the
//! subscription tree.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// One level of structural constraint or value: a 64-bit hashed key.
pub type Segment = u64;

/// The reserved segment value meaning "unconstrained" or "unset".
pub const WILDCARD: Segment = 0;

/// A minimizable ordered sequence of segments computed from a filter.
///
/// An empty path denotes "no constraint at all" and subscribes at the bus
/// root, matching every published value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterPath(Vec<Segment>);

impl FilterPath {
    /// Creates an empty path.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Wraps an explicit segment sequence without minimizing it.
    #[must_use]
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Appends a single segment.
    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    /// Appends every segment of `other`, consuming it.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Trims trailing wildcard segments, always retaining the first entry.
    ///
    /// A reverse scan removes `0` entries from the end down to index 1, so
    /// `[h, 0, 0]` minimizes to `[h]` while `[0]` and `[0, h]` are unchanged.
    pub fn minimize(&mut self) {
        while self.0.len() > 1 && self.0.last() == Some(&WILDCARD) {
            self.0.pop();
        }
    }

    /// Returns the minimized form of this path.
    #[must_use]
    pub fn minimized(mut self) -> Self {
        self.minimize();
        self
    }

    /// The segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the path carries no segments (root-level constraint).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for FilterPath {
    type Target = [Segment];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Segment>> for FilterPath {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<Segment> for FilterPath {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FilterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if *seg == WILDCARD {
                write!(f, "*")?;
            } else {
                write!(f, "{seg:#x}")?;
            }
        }
        write!(f, "]")
    }
}
