//! `with_resource` cancellation safety.
//!
//! Verifies that dropping the future returned by `with_resource` while it
//! is parked inside the user action still releases the resource exactly
//! once, via the detached destroy spawned from `ReleaseGuard`'s `Drop`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stripe_pool::{Manage, Pool};

struct Counting {
    created: Arc<AtomicU64>,
    destroyed: Arc<AtomicU64>,
}

impl Manage for Counting {
    type Resource = u64;
    type Error = std::convert::Infallible;

    async fn create(&self) -> Result<u64, Self::Error> {
        Ok(self.created.fetch_add(1, Ordering::SeqCst))
    }

    async fn destroy(&self, _resource: u64) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_with_resource_mid_action_still_releases() {
    let created = Arc::new(AtomicU64::new(0));
    let destroyed = Arc::new(AtomicU64::new(0));
    let manage = Counting {
        created: Arc::clone(&created),
        destroyed: Arc::clone(&destroyed),
    };
    let pool = Pool::new(manage, 1, Duration::from_secs(30), 1).unwrap();

    let handle = {
        let pool = pool.clone();
        tokio::spawn(async move {
            pool.with_resource(|_r| async move {
                // Sleeps far longer than the cancellation below waits, so
                // the enclosing future is guaranteed to still be parked
                // here when it is dropped.
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<(), std::convert::Infallible>(())
            })
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.abort();
    let _ = handle.await;

    // The detached destroy task spawned from Drop needs a moment to run.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);

    // The stripe must not be left permanently saturated: a fresh acquire
    // must succeed promptly rather than blocking on leaked accounting.
    let leased = tokio::time::timeout(Duration::from_millis(200), pool.take())
        .await
        .expect("pool must recover capacity after a cancelled borrower")
        .unwrap();
    pool.put(leased);
    assert_eq!(created.load(Ordering::SeqCst), 2);
}
