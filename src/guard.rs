//! The resource + stripe handle pair returned by `take`/`try_take`, and the
//! RAII wrapper built on top of it.

use std::ops::{Deref, DerefMut};

/// A resource on loan from the pool, paired with the stripe it came from
/// and the reuse metadata it currently carries.
///
/// Dropping a `Leased` without passing it to [`crate::Pool::put`] or
/// [`crate::Pool::destroy`] leaks pool accounting (the stripe's `in_use`
/// count stays inflated forever) — by design this type does not run a
/// drop-time release itself, so an unused `Leased` shows up as an "unused
/// variable" warning rather than silently doing the wrong thing. Prefer
/// [`crate::Pool::with_resource`]/[`crate::Pool::try_with_resource`], or
/// [`crate::PoolGuard`] for RAII-style release.
#[must_use = "a Leased resource must be returned via Pool::put or Pool::destroy"]
pub struct Leased<R, Meta> {
    pub(crate) resource: R,
    pub(crate) stripe: usize,
    pub(crate) meta: Meta,
}

impl<R, Meta> Leased<R, Meta> {
    pub(crate) fn new(resource: R, stripe: usize, meta: Meta) -> Self {
        Self {
            resource,
            stripe,
            meta,
        }
    }

    /// The stripe this resource was borrowed from.
    pub fn stripe_index(&self) -> usize {
        self.stripe
    }

    /// Consume the lease, discarding the stripe handle and reuse metadata.
    pub fn into_resource(self) -> R {
        self.resource
    }
}

impl<R, Meta> Deref for Leased<R, Meta> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

impl<R, Meta> DerefMut for Leased<R, Meta> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.resource
    }
}
