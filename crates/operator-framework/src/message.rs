//! # Controller Messages
//!
//! Requests sent from a [`ControllerHandle`](crate::ControllerHandle) to the
//! [`Controller`](crate::Controller) task, and the work items the controller forwards
//! to per-primary workers.

use crate::error::FrameworkError;
use crate::event_source::ResourceEvent;
use crate::resource::{ObjectRef, PrimaryResource};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the controller.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

#[derive(Debug)]
pub enum ControllerRequest<P: PrimaryResource> {
    /// A new or changed primary snapshot. The responder, if any, receives the status
    /// written by the first reconcile attempt that covers this snapshot.
    Apply {
        primary: P,
        respond_to: Option<Response<P::Status>>,
    },
    /// A change to a secondary object observed by the host's watch.
    Notify { event: ResourceEvent },
    /// The primary is gone. Its snapshot is forgotten and its worker stops.
    Remove { object: ObjectRef },
}

/// A snapshot queued on one primary's worker.
#[derive(Debug)]
pub(crate) struct WorkItem<P: PrimaryResource> {
    pub primary: P,
    pub respond_to: Option<Response<P::Status>>,
}

#[derive(Debug)]
pub(crate) enum WorkerMessage<P: PrimaryResource> {
    Reconcile(WorkItem<P>),
    /// Drop everything still queued and exit after the running attempt.
    Stop,
}
