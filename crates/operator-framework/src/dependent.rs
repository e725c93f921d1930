//! # DependentResource Trait
//!
//! A dependent resource knows how to converge exactly one owned object (or one
//! role-tagged instance of a shared type) toward the desired state derived from a
//! primary, and how to report what it currently observes for that primary.
//!
//! The reconciler calls `reconcile` and then immediately reads back with
//! `secondary_resource`, so implementations must be read-after-write consistent from
//! the caller's point of view. Backends that are only eventually consistent keep their
//! own cache of the last applied state and answer from it.

use crate::event_source::{EventSource, EventSourceContext};
use crate::resource::PrimaryResource;
use async_trait::async_trait;
use std::fmt::Debug;

/// Per-invocation information passed to reconcilers and dependents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Zero on the first attempt, incremented on each retry of the same snapshot.
    pub retry_attempt: u32,
    /// Set when no further retry will be scheduled after this attempt.
    pub last_attempt: bool,
}

impl Context {
    pub fn first_attempt() -> Self {
        Self::default()
    }
}

/// Trait that every dependent resource controller implements.
///
/// # Associated Types
/// `Secondary` is the observed object type. `Error` is the failure raised when
/// convergence fails; it propagates out of the reconciler uncaught.
#[async_trait]
pub trait DependentResource<P: PrimaryResource>: Send + Sync {
    type Secondary: Clone + Send + Sync + Debug;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Converges the owned resource toward the state derived from `primary`.
    /// Idempotent: calling it again with no change is a no-op on the backend.
    async fn reconcile(&self, primary: &P, ctx: &Context) -> Result<(), Self::Error>;

    /// Best-known observed state correlated to `primary`. `None` means not yet
    /// materialized, which is a normal transient state.
    fn secondary_resource(&self, primary: &P) -> Option<Self::Secondary>;

    /// Describes the watch that re-enqueues the primary when the owned resource changes.
    fn init_event_source(&self, ctx: &EventSourceContext) -> EventSource;
}
