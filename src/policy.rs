//! Reuse policies: the pure `increment`/`is_reusable` pair every stripe
//! consults on return and on the next acquire.

/// Decides whether returned resources may be handed out again, and how
/// their reuse metadata evolves across returns.
///
/// `increment` runs exactly once per successful [`crate::Pool::put`], never
/// on the reaper path and never on acquire. `is_reusable` is consulted by
/// the acquire fast path (to find the first reusable idle entry) and by the
/// reaper (to decide whether an idle entry should be retired even though it
/// isn't stale by time).
pub trait ReusePolicy<R>: Send + Sync + 'static {
    /// Per-resource metadata this policy tracks (reuse counters, etc).
    /// `()` for policies that track nothing.
    type Meta: Clone + Send + 'static;

    /// Metadata for a freshly constructed resource.
    fn init(&self) -> Self::Meta;

    /// Advance a resource's metadata on return. Must be pure.
    fn increment(&self, meta: Self::Meta) -> Self::Meta;

    /// Whether a resource with this metadata may be handed to a new
    /// borrower. Must be pure.
    fn is_reusable(&self, meta: &Self::Meta) -> bool;
}

/// The default policy: every resource is reusable forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl<R> ReusePolicy<R> for Unbounded {
    type Meta = ();

    fn init(&self) {}

    fn increment(&self, _meta: ()) {}

    fn is_reusable(&self, _meta: &()) -> bool {
        true
    }
}

/// Retires a resource after it has been borrowed `max_uses` times.
///
/// `meta` is the number of times the resource has been returned to the
/// pool so far (i.e. the number of completed borrows). A freshly
/// constructed resource starts at `0`; it becomes non-reusable once its
/// counter reaches `max_uses`.
#[derive(Debug, Clone, Copy)]
pub struct BoundedReuse {
    pub(crate) max_uses: u32,
}

impl BoundedReuse {
    /// `max_uses` must be `>= 1`; validated by the pool builder, not here.
    pub(crate) fn new(max_uses: u32) -> Self {
        Self { max_uses }
    }
}

impl<R> ReusePolicy<R> for BoundedReuse {
    type Meta = u32;

    fn init(&self) -> u32 {
        0
    }

    fn increment(&self, meta: u32) -> u32 {
        meta.saturating_add(1)
    }

    fn is_reusable(&self, meta: &u32) -> bool {
        *meta < self.max_uses
    }
}
