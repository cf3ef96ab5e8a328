//! Idle-list entries: a resource paired with its return timestamp and
//! whatever reuse metadata the stripe's policy tracks.

use std::time::Instant;

/// A resource currently held by the pool, available for the next borrower.
pub(crate) struct Entry<R, Meta> {
    pub(crate) resource: R,
    pub(crate) last_use: Instant,
    pub(crate) meta: Meta,
}

impl<R, Meta> Entry<R, Meta> {
    pub(crate) fn new(resource: R, meta: Meta) -> Self {
        Self {
            resource,
            last_use: Instant::now(),
            meta,
        }
    }
}
