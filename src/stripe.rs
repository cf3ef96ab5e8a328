//! The atomic per-stripe transaction: idle list + in-use count, guarded by
//! a single lock, with a `Notify` standing in for the source's
//! software-transactional "retry on change."

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::entry::Entry;
use crate::policy::ReusePolicy;

struct StripeState<R, Meta> {
    idle: VecDeque<Entry<R, Meta>>,
    in_use: usize,
}

/// One independent sub-pool. A borrower is pinned to exactly one stripe
/// for the lifetime of its lease via [`crate::selector::select_stripe`].
pub(crate) struct Stripe<R, Meta> {
    state: Mutex<StripeState<R, Meta>>,
    notify: Notify,
    max: usize,
}

/// Outcome of a single (non-blocking) attempt to find capacity.
pub(crate) enum Slot<R, Meta> {
    /// A warm, reusable idle entry was handed back, along with its current
    /// reuse metadata. No construction needed.
    Reused(R, Meta),
    /// Capacity was reserved; the caller must now invoke the factory and,
    /// on failure, call [`Stripe::compensate`].
    Reserved,
    /// The stripe is at capacity and has no reusable idle entry.
    Full,
}

impl<R, Meta> Stripe<R, Meta> {
    pub(crate) fn new(max: usize) -> Self {
        Self {
            state: Mutex::new(StripeState {
                idle: VecDeque::new(),
                in_use: 0,
            }),
            notify: Notify::new(),
            max,
        }
    }

    /// One attempt at §4.2/§4.3's atomic section, shared by the blocking
    /// and non-blocking acquire paths.
    fn try_once<P>(&self, policy: &P) -> Slot<R, Meta>
    where
        P: ReusePolicy<R, Meta = Meta>,
    {
        let mut state = self.state.lock();
        if let Some(idx) = state
            .idle
            .iter()
            .position(|entry| policy.is_reusable(&entry.meta))
        {
            // Remove just this entry; the non-reusable prefix (and any
            // entries after it) stay in the idle list untouched, to be
            // destroyed by the next reaper sweep rather than on this
            // borrower's critical path.
            let entry = state.idle.remove(idx).expect("checked index");
            return Slot::Reused(entry.resource, entry.meta);
        }
        if state.in_use == self.max {
            return Slot::Full;
        }
        state.in_use += 1;
        Slot::Reserved
    }

    /// Blocking acquire: retries `try_once` until it stops returning `Full`,
    /// parking on `self.notify` between attempts. Never busy-polls: the
    /// `Notified` future is constructed while the lock from the failed
    /// attempt is conceptually still fresh (constructed immediately after
    /// observing `Full`, before any other commit can land) so a concurrent
    /// `put`/`destroy`/reap that lands after we observed `Full` still wakes us.
    pub(crate) async fn take<P>(&self, policy: &P) -> Slot<R, Meta>
    where
        P: ReusePolicy<R, Meta = Meta>,
    {
        loop {
            // Register interest before re-checking so a commit racing with
            // this observation is never missed.
            let notified = self.notify.notified();
            match self.try_once(policy) {
                Slot::Full => notified.await,
                outcome => return outcome,
            }
        }
    }

    /// Non-blocking acquire: a single attempt, never parks.
    pub(crate) fn try_take<P>(&self, policy: &P) -> Slot<R, Meta>
    where
        P: ReusePolicy<R, Meta = Meta>,
    {
        self.try_once(policy)
    }

    /// Roll back a capacity reservation after the factory failed.
    pub(crate) fn compensate(&self) {
        {
            let mut state = self.state.lock();
            state.in_use -= 1;
        }
        self.notify.notify_waiters();
    }

    /// Return a resource to the idle list, applying `increment` exactly
    /// once. `in_use` is unchanged — the resource remains counted.
    pub(crate) fn put<P>(&self, policy: &P, resource: R, meta: Meta)
    where
        P: ReusePolicy<R, Meta = Meta>,
    {
        let meta = policy.increment(meta);
        {
            let mut state = self.state.lock();
            state.idle.push_front(Entry::new(resource, meta));
        }
        self.notify.notify_waiters();
    }

    /// Account for a resource leaving the pool permanently. The caller is
    /// responsible for invoking the destructor; this only updates `in_use`.
    pub(crate) fn destroyed(&self) {
        {
            let mut state = self.state.lock();
            state.in_use -= 1;
        }
        self.notify.notify_waiters();
    }

    /// Partition the idle list into entries that survive and entries that
    /// are stale (by idle time) or non-reusable, detaching the latter for
    /// the caller to destroy outside any lock.
    pub(crate) fn sweep<P>(&self, policy: &P, idle_time: Duration, now: Instant) -> Vec<R>
    where
        P: ReusePolicy<R, Meta = Meta>,
    {
        let mut stale = Vec::new();
        {
            let mut state = self.state.lock();
            let mut fresh = VecDeque::with_capacity(state.idle.len());
            for entry in state.idle.drain(..) {
                let expired = now.saturating_duration_since(entry.last_use) > idle_time;
                if expired || !policy.is_reusable(&entry.meta) {
                    stale.push(entry.resource);
                } else {
                    fresh.push_back(entry);
                }
            }
            state.idle = fresh;
            state.in_use -= stale.len();
        }
        if !stale.is_empty() {
            self.notify.notify_waiters();
        }
        stale
    }

    /// Detach every idle entry unconditionally, decrementing `in_use` for
    /// each one. Used at pool shutdown, where every idle resource is
    /// destroyed regardless of staleness or reusability rather than
    /// waiting for the reaper's next sweep.
    pub(crate) fn drain(&self) -> Vec<R> {
        let drained: Vec<R> = {
            let mut state = self.state.lock();
            let drained = state.idle.drain(..).map(|entry| entry.resource).collect::<Vec<_>>();
            state.in_use -= drained.len();
            drained
        };
        if !drained.is_empty() {
            self.notify.notify_waiters();
        }
        drained
    }

    #[cfg(test)]
    pub(crate) fn in_use(&self) -> usize {
        self.state.lock().in_use
    }

    #[cfg(test)]
    pub(crate) fn idle_len(&self) -> usize {
        self.state.lock().idle.len()
    }
}
