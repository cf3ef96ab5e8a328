//! Deterministic stripe selection keyed to the caller's execution identity.

use std::hash::{DefaultHasher, Hash, Hasher};

/// Picks a stripe index in `[0, stripes)` for the current caller.
///
/// The mapping is `hash(identity) mod stripes`, where `identity` is the
/// current Tokio task id when running on a Tokio runtime, or the OS
/// thread id otherwise. Both are stable for the lifetime of the calling
/// flow, so repeat borrows from the same caller tend to land on the same
/// warm stripe. There is no attempt at balancing load across stripes —
/// the choice is pinned to the caller, not randomized per call.
pub(crate) fn select_stripe(stripes: usize) -> usize {
    debug_assert!(stripes > 0);
    let mut hasher = DefaultHasher::new();
    match tokio::task::try_id() {
        Some(id) => id.hash(&mut hasher),
        None => std::thread::current().id().hash(&mut hasher),
    }
    (hasher.finish() as usize) % stripes
}
