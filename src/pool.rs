//! The public pool surface: construction, the blocking/non-blocking
//! acquire/release protocol, and the scoped-use wrapper.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::builder;
use crate::error::PoolError;
use crate::guard::Leased;
use crate::manage::Manage;
use crate::policy::{BoundedReuse, ReusePolicy, Unbounded};
use crate::reaper;
use crate::selector::select_stripe;
use crate::stripe::{Slot, Stripe};

/// Either a pool-level failure (bad config, factory error) or the user
/// action's own failure, as returned by [`Pool::with_resource`] and
/// [`Pool::try_with_resource`].
#[derive(Debug, thiserror::Error)]
pub enum RunError<E, AE> {
    /// The pool itself failed to produce a resource.
    #[error(transparent)]
    Pool(#[from] PoolError<E>),
    /// The user-supplied action failed. The resource that was handed to
    /// it has already been destroyed by the time this is returned.
    #[error("resource action failed: {0}")]
    Action(#[source] AE),
}

pub(crate) struct Inner<M: Manage, P: ReusePolicy<M::Resource>> {
    pub(crate) manage: M,
    pub(crate) policy: P,
    pub(crate) stripes: Vec<Stripe<M::Resource, P::Meta>>,
    pub(crate) idle_time: Duration,
    max_per_stripe: usize,
    shutdown: Arc<Notify>,
}

/// A striped, bounded pool of reusable resources.
///
/// Borrowers are pinned to one of `num_stripes()` independent stripes by
/// the hash of their execution identity (see [`crate::selector`]). Each
/// stripe blocks new borrowers once it holds `max_resources()` live
/// resources, and a background task retires idle resources older than
/// `idle_time()` once per second.
pub struct Pool<M: Manage, P: ReusePolicy<M::Resource> = Unbounded> {
    inner: Arc<Inner<M, P>>,
}

impl<M: Manage, P: ReusePolicy<M::Resource>> Clone for Pool<M, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Manage> Pool<M, Unbounded> {
    /// Construct a pool with the default reuse policy: every resource is
    /// reusable until it is reaped for idling.
    ///
    /// # Errors
    /// `stripes < 1`, `idle_time < 500ms`, or `max_per_stripe < 1`.
    pub fn new(
        manage: M,
        stripes: usize,
        idle_time: Duration,
        max_per_stripe: usize,
    ) -> Result<Self, PoolError<M::Error>> {
        builder::validate(stripes, idle_time, max_per_stripe)?;
        Ok(Self::build(manage, Unbounded, stripes, idle_time, max_per_stripe))
    }
}

impl<M: Manage> Pool<M, BoundedReuse> {
    /// Construct a pool whose resources are retired after `max_uses`
    /// successful borrows, sharing all of the general pool's protocol
    /// code via [`BoundedReuse`].
    ///
    /// # Errors
    /// As [`Pool::new`], plus `max_uses < 1`.
    pub fn new_bounded_reuse(
        manage: M,
        stripes: usize,
        idle_time: Duration,
        max_per_stripe: usize,
        max_uses: u32,
    ) -> Result<Self, PoolError<M::Error>> {
        builder::validate(stripes, idle_time, max_per_stripe)?;
        builder::validate_max_uses(max_uses)?;
        Ok(Self::build(
            manage,
            BoundedReuse::new(max_uses),
            stripes,
            idle_time,
            max_per_stripe,
        ))
    }
}

impl<M: Manage, P: ReusePolicy<M::Resource>> Pool<M, P> {
    fn build(
        manage: M,
        policy: P,
        stripes: usize,
        idle_time: Duration,
        max_per_stripe: usize,
    ) -> Self {
        let inner = Arc::new(Inner {
            manage,
            policy,
            stripes: (0..stripes).map(|_| Stripe::new(max_per_stripe)).collect(),
            idle_time,
            max_per_stripe,
            shutdown: Arc::new(Notify::new()),
        });
        reaper::spawn(Arc::downgrade(&inner), Arc::clone(&inner.shutdown));
        #[cfg(feature = "tracing")]
        tracing::debug!(stripes, max_per_stripe, ?idle_time, "created resource pool");
        Self { inner }
    }

    /// The configured idle time before an unused resource is reaped.
    pub fn idle_time(&self) -> Duration {
        self.inner.idle_time
    }

    /// The configured maximum number of live resources per stripe.
    pub fn max_resources(&self) -> usize {
        self.inner.max_per_stripe
    }

    /// The configured number of stripes.
    pub fn num_stripes(&self) -> usize {
        self.inner.stripes.len()
    }

    /// Shut the pool down: stop the background reaper and destroy every
    /// resource currently idle in every stripe.
    ///
    /// Per spec §8 invariant 2, the count of completed factory calls must
    /// equal the count of completed destructor calls once the pool is
    /// drained and closed — so unlike the reaper (which only retires
    /// stale or non-reusable entries), `close` unconditionally drains and
    /// destroys every idle entry, regardless of age or reusability,
    /// rather than leaving them for a reaper sweep that will never come.
    ///
    /// Resources already borrowed (not idle) are unaffected: `take`/
    /// `put`/`destroy` keep working on them, and safe to call more than
    /// once or while other clones of this pool are still in use.
    pub async fn close(&self) {
        self.inner.shutdown.notify_waiters();
        for stripe in self.inner.stripes.iter() {
            for resource in stripe.drain() {
                self.inner.manage.destroy(resource).await;
            }
        }
    }

    fn stripe_for_caller(&self) -> (usize, &Stripe<M::Resource, P::Meta>) {
        let idx = select_stripe(self.inner.stripes.len());
        (idx, &self.inner.stripes[idx])
    }

    /// Blocking acquire (§4.2). Blocks if the selected stripe is at
    /// capacity and has no reusable idle entry; never busy-polls.
    pub async fn take(&self) -> Result<Leased<M::Resource, P::Meta>, PoolError<M::Error>> {
        let (idx, stripe) = self.stripe_for_caller();
        match stripe.take(&self.inner.policy).await {
            Slot::Reused(resource, meta) => Ok(Leased::new(resource, idx, meta)),
            Slot::Reserved => match self.inner.manage.create().await {
                Ok(resource) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(stripe = idx, "constructed new resource");
                    Ok(Leased::new(resource, idx, self.inner.policy.init()))
                }
                Err(err) => {
                    stripe.compensate();
                    Err(PoolError::Factory(err))
                }
            },
            Slot::Full => unreachable!("Stripe::take only returns Full from try_take"),
        }
    }

    /// Non-blocking acquire (§4.3). Returns `Ok(None)` instead of blocking
    /// when the selected stripe is saturated.
    pub async fn try_take(
        &self,
    ) -> Result<Option<Leased<M::Resource, P::Meta>>, PoolError<M::Error>> {
        let (idx, stripe) = self.stripe_for_caller();
        match stripe.try_take(&self.inner.policy) {
            Slot::Reused(resource, meta) => Ok(Some(Leased::new(resource, idx, meta))),
            Slot::Reserved => match self.inner.manage.create().await {
                Ok(resource) => Ok(Some(Leased::new(resource, idx, self.inner.policy.init()))),
                Err(err) => {
                    stripe.compensate();
                    Err(PoolError::Factory(err))
                }
            },
            Slot::Full => Ok(None),
        }
    }

    /// Release protocol (§4.4): return a resource to the idle list of the
    /// stripe it came from, applying the reuse policy's `increment`.
    pub fn put(&self, leased: Leased<M::Resource, P::Meta>) {
        let Leased {
            resource,
            stripe,
            meta,
        } = leased;
        self.inner.stripes[stripe].put(&self.inner.policy, resource, meta);
    }

    /// Destroy protocol (§4.5): invoke the destructor (suppressing any
    /// failure) and decrement the stripe's `in_use` count.
    pub async fn destroy(&self, leased: Leased<M::Resource, P::Meta>) {
        let Leased {
            resource, stripe, ..
        } = leased;
        self.inner.manage.destroy(resource).await;
        self.inner.stripes[stripe].destroyed();
    }

    /// Scoped-use wrapper (§4.6), blocking variant. Acquires a resource,
    /// runs `action`, and returns it to the idle list on success or
    /// destroys it on failure — exactly once, even if `action` fails or
    /// this future is dropped mid-wait.
    pub async fn with_resource<F, Fut, T, AE>(&self, action: F) -> Result<T, RunError<M::Error, AE>>
    where
        F: FnOnce(&mut M::Resource) -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, AE>> + Send,
        AE: std::error::Error + Send + Sync + 'static,
        T: Send,
    {
        let leased = self.take().await.map_err(RunError::Pool)?;
        self.run_with(leased, action).await
    }

    /// Scoped-use wrapper (§4.6), non-blocking variant. Returns `Ok(None)`
    /// without invoking `action` at all if the pool is saturated.
    pub async fn try_with_resource<F, Fut, T, AE>(
        &self,
        action: F,
    ) -> Result<Option<T>, RunError<M::Error, AE>>
    where
        F: FnOnce(&mut M::Resource) -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, AE>> + Send,
        AE: std::error::Error + Send + Sync + 'static,
        T: Send,
    {
        let leased = match self.try_take().await.map_err(RunError::Pool)? {
            Some(leased) => leased,
            None => return Ok(None),
        };
        self.run_with(leased, action).await.map(Some)
    }

    async fn run_with<F, Fut, T, AE>(
        &self,
        leased: Leased<M::Resource, P::Meta>,
        action: F,
    ) -> Result<T, RunError<M::Error, AE>>
    where
        F: FnOnce(&mut M::Resource) -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, AE>> + Send,
        AE: std::error::Error + Send + Sync + 'static,
        T: Send,
    {
        // Everything from here to the `action(...).await` below is plain,
        // non-suspending bookkeeping, so it runs to completion regardless
        // of the surrounding future's cancellation — this is the "masked"
        // region. The one real suspension point, the action itself, is
        // covered instead by `guard`: if this whole future is dropped
        // while parked inside `action(...).await`, `guard`'s `Drop` impl
        // spawns the destroy as a detached task so capacity is never
        // permanently lost to a cancelled borrower.
        let mut guard = ReleaseGuard {
            pool: self.clone(),
            leased: Some(leased),
        };

        let result = {
            let resource = &mut guard.leased.as_mut().expect("guard armed").resource;
            action(resource).await
        };

        let leased = guard.disarm();
        match result {
            Ok(value) => {
                self.put(leased);
                Ok(value)
            }
            Err(err) => {
                self.destroy(leased).await;
                Err(RunError::Action(err))
            }
        }
    }
}

/// RAII fallback release: if dropped while still armed (i.e. the
/// surrounding future was cancelled before `run_with` could disarm it),
/// spawns the destroy path as a detached task rather than leaking the
/// stripe's `in_use` accounting.
struct ReleaseGuard<M: Manage, P: ReusePolicy<M::Resource>> {
    pool: Pool<M, P>,
    leased: Option<Leased<M::Resource, P::Meta>>,
}

impl<M: Manage, P: ReusePolicy<M::Resource>> ReleaseGuard<M, P> {
    fn disarm(&mut self) -> Leased<M::Resource, P::Meta> {
        self.leased.take().expect("guard used after disarm")
    }
}

impl<M: Manage, P: ReusePolicy<M::Resource>> Drop for ReleaseGuard<M, P> {
    fn drop(&mut self) {
        if let Some(leased) = self.leased.take() {
            let pool = self.pool.clone();
            tokio::spawn(async move {
                pool.destroy(leased).await;
            });
        }
    }
}

/// RAII wrapper around a [`Leased`] resource for callers who want
/// drop-based release instead of the explicit `put`/`destroy` pair or the
/// scoped wrapper. A successful scope ends with [`PoolGuard::release`]
/// (returns the resource); dropping without calling it destroys the
/// resource instead, matching the "action failed" path.
pub struct PoolGuard<M: Manage, P: ReusePolicy<M::Resource>> {
    inner: ReleaseGuard<M, P>,
}

impl<M: Manage, P: ReusePolicy<M::Resource>> PoolGuard<M, P> {
    /// Wrap a leased resource for drop-based release.
    pub fn new(pool: Pool<M, P>, leased: Leased<M::Resource, P::Meta>) -> Self {
        Self {
            inner: ReleaseGuard {
                pool,
                leased: Some(leased),
            },
        }
    }

    /// Return the resource to the pool instead of destroying it on drop.
    pub fn release(mut self) {
        let leased = self.inner.disarm();
        self.inner.pool.put(leased);
    }

    /// Explicitly destroy the resource instead of waiting for drop (which
    /// would do the same thing, but asynchronously and detached).
    pub async fn discard(mut self) {
        let pool = self.inner.pool.clone();
        let leased = self.inner.disarm();
        pool.destroy(leased).await;
    }
}

impl<M: Manage, P: ReusePolicy<M::Resource>> std::ops::Deref for PoolGuard<M, P> {
    type Target = M::Resource;

    fn deref(&self) -> &M::Resource {
        &self.inner.leased.as_ref().expect("guard armed").resource
    }
}

impl<M: Manage, P: ReusePolicy<M::Resource>> std::ops::DerefMut for PoolGuard<M, P> {
    fn deref_mut(&mut self) -> &mut M::Resource {
        &mut self.inner.leased.as_mut().expect("guard armed").resource
    }
}
