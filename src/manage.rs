//! The two opaque effects a pool invokes: construct a resource, destroy one.

use std::future::Future;

/// Constructs and destroys instances of a single resource type.
///
/// `create` and `destroy` are the pool's only collaborators with the
/// outside world — everything else (database-specific logic, connection
/// handshakes, logging) lives on the implementor's side of this trait.
///
/// A failing `create` propagates to the caller of [`crate::Pool::take`] /
/// [`crate::Pool::with_resource`] and its siblings. A failing `destroy` is
/// always suppressed by the pool: destruction is best-effort cleanup and
/// must never corrupt pool accounting or escape into an unrelated call
/// stack, so this method does not return a `Result` at all.
pub trait Manage: Send + Sync + 'static {
    /// The pooled resource type.
    type Resource: Send + 'static;

    /// The error type `create` may fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct a new resource instance.
    fn create(&self) -> impl Future<Output = Result<Self::Resource, Self::Error>> + Send;

    /// Destroy a resource instance. Failures are the implementor's to log;
    /// the pool suppresses them unconditionally.
    fn destroy(&self, resource: Self::Resource) -> impl Future<Output = ()> + Send;
}
