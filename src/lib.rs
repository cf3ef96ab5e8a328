#![allow(clippy::excessive_nesting)]

//! # stripe-pool
//!
//! A striped, bounded, reusable resource pool. Canonically used to manage
//! database connections, but agnostic to the resource type: the caller
//! supplies a [`Manage`] implementation (construct one resource, destroy
//! one resource) and the pool handles the concurrent accounting —
//! blocking borrowers at a per-stripe capacity, preferring warm (recently
//! returned) resources, and reaping ones that have sat idle too long.
//!
//! Borrowers are pinned to one of several independent stripes by the hash
//! of their calling task/thread, so repeat borrows from the same flow
//! tend to reuse the same warm stripe. Stripes do not balance load against
//! each other, there is no fair FIFO queuing of waiters (any waiter may be
//! woken when capacity frees), and the only health signal is idle time
//! plus an optional bounded-reuse counter — see [`BoundedReuse`].
//!
//! ```no_run
//! use std::time::Duration;
//! use stripe_pool::{Manage, Pool};
//!
//! struct Connections;
//!
//! impl Manage for Connections {
//!     type Resource = u64;
//!     type Error = std::convert::Infallible;
//!
//!     async fn create(&self) -> Result<u64, Self::Error> {
//!         Ok(42)
//!     }
//!
//!     async fn destroy(&self, _resource: u64) {}
//! }
//!
//! # async fn run() {
//! let pool = Pool::new(Connections, 4, Duration::from_secs(30), 10).unwrap();
//! let doubled = pool
//!     .with_resource(|conn: &mut u64| {
//!         let value = *conn;
//!         async move { Ok::<u64, std::convert::Infallible>(value * 2) }
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(doubled, 84);
//! # }
//! ```

mod builder;
mod entry;
mod error;
mod guard;
mod manage;
mod policy;
mod pool;
mod reaper;
mod selector;
mod stripe;

pub use error::{PoolError, Result};
pub use guard::Leased;
pub use manage::Manage;
pub use policy::{BoundedReuse, ReusePolicy, Unbounded};
pub use pool::{Pool, PoolGuard, RunError};
