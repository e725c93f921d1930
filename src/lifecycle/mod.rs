mod solver_store;

pub use solver_store::SolverStore;

use crate::cluster::InMemoryCluster;
use crate::model::{Solver, SolverStatus};
use crate::reconciler::SolverReconciler;
use operator_framework::{
    Controller, ControllerConfig, ControllerHandle, FrameworkError, InMemoryStatusStore,
    ObjectRef, PrimaryResource, ResourceEvent,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// The running solver operator.
///
/// `SolverSystem` is responsible for:
/// - **Wiring**: one [`SolverReconciler`] over the six cluster-backed dependents,
///   driven by a [`Controller`] that writes statuses back into the [`SolverStore`]
/// - **Watching**: forwarding every change in the [`InMemoryCluster`] to the controller,
///   which re-enqueues the owning solver when one of its event sources matches
/// - **Shutdown**: stopping the forwarder, closing the controller and waiting for it
///
/// # Example
///
/// ```ignore
/// let system = SolverSystem::new(ControllerConfig::default())?;
///
/// let status = system.apply(solver).await?;
/// assert!(status.is_ready());
///
/// system.shutdown().await?;
/// ```
pub struct SolverSystem {
    /// Backing store of every object the solvers own
    pub cluster: InMemoryCluster,

    /// Latest status written for each solver, with history
    pub statuses: InMemoryStatusStore<Solver>,

    solvers: SolverStore,

    /// Handle for enqueueing solver snapshots
    pub controller: ControllerHandle<Solver>,

    controller_task: JoinHandle<()>,
    forwarder_task: JoinHandle<()>,
}

impl SolverSystem {
    /// Starts the controller and the event forwarder on an empty cluster.
    pub fn new(config: ControllerConfig) -> Result<Self, FrameworkError> {
        Self::with_cluster(InMemoryCluster::new(), config)
    }

    pub fn with_cluster(
        cluster: InMemoryCluster,
        config: ControllerConfig,
    ) -> Result<Self, FrameworkError> {
        let solvers = SolverStore::new();
        let statuses = solvers.statuses().clone();
        let reconciler = SolverReconciler::for_cluster(&cluster);
        let (controller, handle) = Controller::new(reconciler, solvers.clone(), config)?;

        // Subscribe before the controller runs so no change goes unseen
        let events = cluster.subscribe();
        let controller_task = tokio::spawn(controller.run());
        let forwarder_task = tokio::spawn(forward_events(events, handle.clone()));
        info!("Solver operator started");

        Ok(Self {
            cluster,
            statuses,
            solvers,
            controller: handle,
            controller_task,
            forwarder_task,
        })
    }

    /// Enqueues `solver` and returns the status written by the first attempt.
    #[instrument(skip_all, fields(solver = %solver.object_ref(), generation = solver.generation()))]
    pub async fn apply(&self, solver: Solver) -> Result<SolverStatus, FrameworkError> {
        self.solvers.upsert(solver.clone());
        self.controller.reconcile(solver).await
    }

    /// Latest status written for `solver`.
    pub fn status(&self, solver: &Solver) -> Option<SolverStatus> {
        self.statuses.get(&solver.object_ref())
    }

    /// The stored solver, carrying the last status written for it.
    pub fn get(&self, object: &ObjectRef) -> Option<Solver> {
        self.solvers.get(object)
    }

    /// Forgets a deleted solver and stops its worker. Owned objects are left to
    /// ownership-based garbage collection.
    #[instrument(skip(self))]
    pub async fn remove(&self, object: &ObjectRef) -> Result<Option<Solver>, FrameworkError> {
        self.controller.remove(object.clone()).await?;
        Ok(self.solvers.remove(object))
    }

    /// Stops the system.
    ///
    /// The forwarder is stopped first since it holds a controller handle. The controller
    /// then exits once every other handle is dropped, after its workers finish their
    /// current reconcile.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down solver operator...");

        self.forwarder_task.abort();
        if let Err(e) = self.forwarder_task.await {
            if !e.is_cancelled() {
                error!("Event forwarder failed: {:?}", e);
                return Err(format!("Event forwarder failed: {:?}", e));
            }
        }

        drop(self.controller);
        if let Err(e) = self.controller_task.await {
            error!("Controller task failed: {:?}", e);
            return Err(format!("Controller task failed: {:?}", e));
        }

        info!("Solver operator shutdown complete.");
        Ok(())
    }
}

async fn forward_events(
    mut events: broadcast::Receiver<ResourceEvent>,
    controller: ControllerHandle<Solver>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                debug!(kind = %event.kind, object = %event.object, "Cluster change");
                if controller.notify(event).await.is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event forwarder lagged, changes dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("Event forwarder stopped");
}
