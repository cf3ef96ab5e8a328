//! Background sweep that retires stale or non-reusable idle entries.

use std::sync::Weak;
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::manage::Manage;
use crate::policy::ReusePolicy;
use crate::pool::Inner;

/// Fixed wake interval. Effective idle-time-to-destruction may exceed
/// `idle_time` by up to one wake period — documented, not a bug.
pub(crate) const WAKE_INTERVAL: Duration = Duration::from_secs(1);

pub(crate) fn spawn<M, P>(inner: Weak<Inner<M, P>>, shutdown: std::sync::Arc<Notify>)
where
    M: Manage,
    P: ReusePolicy<M::Resource>,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(WAKE_INTERVAL);
        interval.tick().await; // first tick fires immediately; consume it
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                () = shutdown.notified() => break,
            }
            let Some(inner) = inner.upgrade() else {
                break;
            };
            sweep_once(&inner).await;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("pool reaper terminated");
    });
}

async fn sweep_once<M, P>(inner: &Inner<M, P>)
where
    M: Manage,
    P: ReusePolicy<M::Resource>,
{
    let now = Instant::now();
    for stripe in inner.stripes.iter() {
        let stale = stripe.sweep(&inner.policy, inner.idle_time, now);
        if stale.is_empty() {
            continue;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(count = stale.len(), "reaper destroying stale entries");
        for resource in stale {
            inner.manage.destroy(resource).await;
        }
    }
}
