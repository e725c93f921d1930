//! # Controller
//!
//! The scheduler that drives a [`Reconciler`]. It is split the same way as any actor:
//! the [`Controller`] owns state and a receiver and runs in its own task, while the
//! cloneable [`ControllerHandle`] sends requests to it.
//!
//! **Concurrency Model**:
//! The controller task only dispatches and never waits on a worker. Every primary
//! identity gets its own worker task with its own unbounded queue, so reconciles of one
//! primary never overlap while different primaries reconcile in parallel. A worker
//! drains its queue before each attempt and keeps only the newest snapshot, which keeps
//! a queue at one pending snapshot per primary in practice.
//!
//! **Removal**:
//! [`ControllerHandle::remove`] forgets a primary and stops its worker. A later apply
//! for the same identity starts a fresh worker that waits for the old one to exit.
//!
//! **Retry**:
//! After a failed reconcile the worker writes the error status, then waits
//! [`ControllerConfig::backoff`] before retrying the same snapshot. A newer snapshot
//! arriving during the wait supersedes the retry.

use crate::config::ControllerConfig;
use crate::dependent::Context;
use crate::error::FrameworkError;
use crate::event_source::{EventSourceContext, EventSources, ResourceEvent};
use crate::message::{ControllerRequest, Response, WorkItem, WorkerMessage};
use crate::reconciler::Reconciler;
use crate::resource::{ObjectRef, PrimaryResource};
use crate::status::StatusWriter;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

pub struct Controller<P, R, W>
where
    P: PrimaryResource,
    R: Reconciler<P>,
    W: StatusWriter<P>,
{
    receiver: mpsc::Receiver<ControllerRequest<P>>,
    reconciler: Arc<R>,
    writer: Arc<W>,
    config: ControllerConfig,
    event_sources: EventSources,
    primaries: HashMap<ObjectRef, P>,
    workers: HashMap<ObjectRef, WorkerSlot<P>>,
    /// Workers of removed primaries that may still be finishing an attempt.
    retiring: HashMap<ObjectRef, JoinHandle<()>>,
}

struct WorkerSlot<P: PrimaryResource> {
    sender: mpsc::UnboundedSender<WorkerMessage<P>>,
    handle: JoinHandle<()>,
}

impl<P, R, W> Controller<P, R, W>
where
    P: PrimaryResource,
    R: Reconciler<P>,
    W: StatusWriter<P>,
{
    /// Creates a controller and its handle. Fails if the reconciler's event sources
    /// cannot be named uniquely or the configuration is invalid.
    pub fn new(
        reconciler: R,
        writer: W,
        config: ControllerConfig,
    ) -> Result<(Self, ControllerHandle<P>), FrameworkError> {
        config.validate()?;
        let event_sources = reconciler.prepare_event_sources(&EventSourceContext {
            primary_kind: P::KIND,
        })?;
        info!(kind = P::KIND, sources = event_sources.len(), "Event sources registered");

        let (sender, receiver) = mpsc::channel(config.channel_buffer);
        let controller = Self {
            receiver,
            reconciler: Arc::new(reconciler),
            writer: Arc::new(writer),
            config,
            event_sources,
            primaries: HashMap::new(),
            workers: HashMap::new(),
            retiring: HashMap::new(),
        };
        Ok((controller, ControllerHandle::new(sender)))
    }

    pub fn event_sources(&self) -> &EventSources {
        &self.event_sources
    }

    /// Runs the dispatch loop until every handle is dropped, then waits for the workers
    /// to finish their current reconcile.
    pub async fn run(mut self) {
        info!(kind = P::KIND, "Controller started");

        while let Some(request) = self.receiver.recv().await {
            match request {
                ControllerRequest::Apply {
                    primary,
                    respond_to,
                } => {
                    let object = primary.object_ref();
                    debug!(kind = P::KIND, %object, generation = primary.generation(), "Apply");
                    self.primaries.insert(object.clone(), primary.clone());
                    let item = WorkItem {
                        primary,
                        respond_to,
                    };
                    self.dispatch(object, item);
                }
                ControllerRequest::Notify { event } => self.notify(event),
                ControllerRequest::Remove { object } => self.remove(object),
            }
        }

        info!(kind = P::KIND, workers = self.workers.len(), "Controller stopping");
        // Dropping the senders lets every worker finish its queue and exit
        let handles: Vec<_> = self
            .workers
            .drain()
            .map(|(_, slot)| slot.handle)
            .chain(self.retiring.drain().map(|(_, handle)| handle))
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(kind = P::KIND, error = %e, "Worker task failed");
            }
        }
        info!(kind = P::KIND, "Shutdown");
    }

    fn notify(&mut self, event: ResourceEvent) {
        let Some(source) = self.event_sources.matching(&event) else {
            debug!(kind = %event.kind, object = %event.object, "No event source matches");
            return;
        };
        let Some(owner) = event.owner_of_kind(P::KIND) else {
            debug!(source, object = %event.object, "Event without owner of this kind");
            return;
        };
        let Some(primary) = self.primaries.get(&owner).cloned() else {
            debug!(source, %owner, "Owner not known to controller");
            return;
        };
        debug!(source, %owner, object = %event.object, "Re-enqueue owner");
        let item = WorkItem {
            primary,
            respond_to: None,
        };
        self.dispatch(owner, item);
    }

    fn remove(&mut self, object: ObjectRef) {
        self.primaries.remove(&object);
        self.retiring.retain(|_, handle| !handle.is_finished());
        if let Some(slot) = self.workers.remove(&object) {
            debug!(kind = P::KIND, %object, "Remove");
            let _ = slot.sender.send(WorkerMessage::Stop);
            self.retiring.insert(object, slot.handle);
        }
    }

    fn dispatch(&mut self, object: ObjectRef, item: WorkItem<P>) {
        let sender = match self.workers.get(&object) {
            Some(slot) => slot.sender.clone(),
            None => self.spawn_worker(object.clone()),
        };
        if let Err(mpsc::error::SendError(message)) = sender.send(WorkerMessage::Reconcile(item)) {
            warn!(%object, "Worker closed");
            self.workers.remove(&object);
            if let WorkerMessage::Reconcile(WorkItem {
                respond_to: Some(respond_to),
                ..
            }) = message
            {
                let _ = respond_to.send(Err(FrameworkError::ControllerClosed));
            }
        }
    }

    fn spawn_worker(&mut self, object: ObjectRef) -> mpsc::UnboundedSender<WorkerMessage<P>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = Worker {
            object: object.clone(),
            receiver,
            reconciler: self.reconciler.clone(),
            writer: self.writer.clone(),
            config: self.config.clone(),
            _primary: PhantomData,
        };
        let predecessor = self.retiring.remove(&object);
        let span = info_span!("worker", kind = P::KIND, %object);
        let handle = tokio::spawn(worker.run(predecessor).instrument(span));
        self.workers.insert(
            object,
            WorkerSlot {
                sender: sender.clone(),
                handle,
            },
        );
        sender
    }
}

/// Serial reconcile loop for a single primary identity.
struct Worker<P, R, W>
where
    P: PrimaryResource,
{
    object: ObjectRef,
    receiver: mpsc::UnboundedReceiver<WorkerMessage<P>>,
    reconciler: Arc<R>,
    writer: Arc<W>,
    config: ControllerConfig,
    _primary: PhantomData<fn() -> P>,
}

struct Attempt<S> {
    status: S,
    failed: bool,
}

impl<P, R, W> Worker<P, R, W>
where
    P: PrimaryResource,
    R: Reconciler<P>,
    W: StatusWriter<P>,
{
    async fn run(mut self, predecessor: Option<JoinHandle<()>>) {
        if let Some(predecessor) = predecessor {
            let _ = predecessor.await;
        }
        let mut pending: Option<WorkItem<P>> = None;

        loop {
            let item = match pending.take() {
                Some(item) => item,
                None => match self.receiver.recv().await {
                    Some(WorkerMessage::Reconcile(item)) => item,
                    Some(WorkerMessage::Stop) | None => break,
                },
            };
            let Some((primary, mut responders)) = self.coalesce(item) else {
                break;
            };

            let mut attempt = 0;
            loop {
                let ctx = Context {
                    retry_attempt: attempt,
                    last_attempt: attempt >= self.config.max_retries,
                };
                let result = self.reconcile_once(&primary, &ctx).await;
                for respond_to in responders.drain(..) {
                    let reply = match &result {
                        Ok(attempt) => Ok(attempt.status.clone()),
                        Err(e) => Err(e.clone()),
                    };
                    let _ = respond_to.send(reply);
                }

                let failed = result.as_ref().map_or(true, |a| a.failed);
                if !failed || ctx.last_attempt {
                    break;
                }

                attempt += 1;
                let delay = self.config.backoff(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Retry scheduled");
                match tokio::time::timeout(delay, self.receiver.recv()).await {
                    Ok(Some(WorkerMessage::Reconcile(newer))) => {
                        debug!("Retry superseded by newer snapshot");
                        pending = Some(newer);
                        break;
                    }
                    Ok(Some(WorkerMessage::Stop)) | Ok(None) => {
                        debug!(object = %self.object, "Worker stopped during backoff");
                        return;
                    }
                    Err(_elapsed) => {}
                }
            }
        }

        debug!(object = %self.object, "Worker stopped");
    }

    /// Folds every queued snapshot into the newest one, keeping all responders.
    /// Returns `None` when a stop is queued, after failing the collected responders.
    fn coalesce(&mut self, item: WorkItem<P>) -> Option<(P, Vec<Response<P::Status>>)> {
        let mut primary = item.primary;
        let mut responders: Vec<_> = item.respond_to.into_iter().collect();
        while let Ok(message) = self.receiver.try_recv() {
            match message {
                WorkerMessage::Reconcile(next) => {
                    primary = next.primary;
                    responders.extend(next.respond_to);
                }
                WorkerMessage::Stop => {
                    for respond_to in responders {
                        let _ = respond_to.send(Err(FrameworkError::ControllerClosed));
                    }
                    return None;
                }
            }
        }
        Some((primary, responders))
    }

    async fn reconcile_once(
        &self,
        primary: &P,
        ctx: &Context,
    ) -> Result<Attempt<P::Status>, FrameworkError> {
        let generation = primary.generation();
        let attempt = match self.reconciler.reconcile(primary, ctx).await {
            Ok(status) => {
                info!(generation, ?status, "Reconciled");
                Attempt {
                    status,
                    failed: false,
                }
            }
            Err(e) => {
                warn!(generation, retry_attempt = ctx.retry_attempt, error = %e, "Reconcile failed");
                Attempt {
                    status: self.reconciler.error_status(primary, ctx, &e),
                    failed: true,
                }
            }
        };

        if let Err(e) = self
            .writer
            .write_status(&self.object, attempt.status.clone())
            .await
        {
            warn!(generation, error = %e, "Status write failed");
            return Err(e);
        }
        Ok(attempt)
    }
}

/// A cloneable, type-safe handle for sending work to a [`Controller`].
pub struct ControllerHandle<P: PrimaryResource> {
    sender: mpsc::Sender<ControllerRequest<P>>,
}

impl<P: PrimaryResource> Clone for ControllerHandle<P> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<P: PrimaryResource> ControllerHandle<P> {
    pub fn new(sender: mpsc::Sender<ControllerRequest<P>>) -> Self {
        Self { sender }
    }

    /// Enqueues a snapshot and waits for the status written by its first attempt.
    pub async fn reconcile(&self, primary: P) -> Result<P::Status, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ControllerRequest::Apply {
                primary,
                respond_to: Some(respond_to),
            })
            .await
            .map_err(|_| FrameworkError::ControllerClosed)?;
        response
            .await
            .map_err(|_| FrameworkError::ControllerDropped)?
    }

    /// Enqueues a snapshot without waiting for the outcome.
    pub async fn apply(&self, primary: P) -> Result<(), FrameworkError> {
        self.sender
            .send(ControllerRequest::Apply {
                primary,
                respond_to: None,
            })
            .await
            .map_err(|_| FrameworkError::ControllerClosed)
    }

    /// Forgets the primary and stops its worker once the running attempt ends.
    pub async fn remove(&self, object: ObjectRef) -> Result<(), FrameworkError> {
        self.sender
            .send(ControllerRequest::Remove { object })
            .await
            .map_err(|_| FrameworkError::ControllerClosed)
    }

    /// Forwards a secondary-object change observed by the host's watch.
    pub async fn notify(&self, event: ResourceEvent) -> Result<(), FrameworkError> {
        self.sender
            .send(ControllerRequest::Notify { event })
            .await
            .map_err(|_| FrameworkError::ControllerClosed)
    }
}
