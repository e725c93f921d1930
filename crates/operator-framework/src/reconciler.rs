//! # Reconciler Trait
//!
//! The reconciler is the level-triggered function at the heart of a controller: given a
//! primary snapshot it converges every dependent and returns the status to write back.
//! The [`Controller`](crate::Controller) calls it, writes exactly one status per
//! invocation, and owns the retry cadence. A reconciler never retries internally.

use crate::dependent::Context;
use crate::error::FrameworkError;
use crate::event_source::{EventSourceContext, EventSources};
use crate::resource::PrimaryResource;
use async_trait::async_trait;

#[async_trait]
pub trait Reconciler<P: PrimaryResource>: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Converges dependents for `primary` and renders its new status.
    async fn reconcile(&self, primary: &P, ctx: &Context) -> Result<P::Status, Self::Error>;

    /// Renders the status written when `reconcile` failed.
    fn error_status(&self, primary: &P, ctx: &Context, error: &Self::Error) -> P::Status;

    /// Watches that re-enqueue a primary when one of its dependents changes.
    fn prepare_event_sources(
        &self,
        ctx: &EventSourceContext,
    ) -> Result<EventSources, FrameworkError> {
        let _ = ctx;
        Ok(EventSources::default())
    }
}
