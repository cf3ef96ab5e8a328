//! Error types for the pool.

use thiserror::Error;

/// Result type for pool operations, parameterized by the user's factory
/// error type.
pub type Result<T, E> = std::result::Result<T, PoolError<E>>;

/// Errors a pool can surface.
///
/// Destructor failures are not a variant here: per the pool's contract
/// they are always suppressed, never propagated. See [`crate::Manage`].
#[derive(Error, Debug)]
pub enum PoolError<E> {
    /// Pool construction was given an invalid parameter.
    #[error("invalid pool configuration: {field}: {reason}")]
    Configuration {
        /// The offending field (`"stripes"`, `"idle_time"`, `"max_per_stripe"`, `"max_uses"`).
        field: &'static str,
        /// Human-readable description of the constraint that was violated.
        reason: String,
    },

    /// The user's factory failed while constructing a new resource.
    #[error("resource factory failed: {0}")]
    Factory(#[source] E),
}

impl<E> PoolError<E> {
    pub(crate) fn configuration(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }
}
