//! Error types for pathbus.
//!
//! All errors are strongly typed using thiserror. The surface is deliberately
//! small: ordinary absence (a missing child, an unknown subscription id, a
//! read against a node that was never created) is *not* an error anywhere in
//! this crate; those resolve silently to empty results. Only malformed
//! filters and internal invariant violations are surfaced.

use thiserror::Error;

/// Filter validation errors.
///
/// These indicate a logic defect in the code that built the filter, not a
/// transient condition; callers should treat them as fatal for the operation
/// that produced the filter.
#[derive(Debug, Error)]
pub enum FilterError {
    /// More than one member of a mutually-exclusive peer field set was
    /// populated in the same filter.
    #[error("peer group '{group}' has {populated} populated members, at most one may be set")]
    AmbiguousPeers {
        /// Name of the exclusivity group, as declared by the codec.
        group: &'static str,
        /// How many members were found populated.
        populated: usize,
    },
}

/// Top-level error type for pathbus operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// A filter failed validation while being encoded into a path.
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// An internal invariant was violated.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable description of the violation.
        message: String,
    },
}

impl BusError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a filter validation error.
    #[must_use]
    pub const fn is_filter(&self) -> bool {
        matches!(self, Self::Filter(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for pathbus operations.
pub type BusResult<T> = Result<T, BusError>;
