//! # Solver Dependents
//!
//! One [`DependentResource`] per object a solver owns. Each computes the desired object
//! from the solver's spec, applies it to the [`InMemoryCluster`], and reads back what
//! the cluster holds for that solver.
//!
//! All of them share one capability shape, [`SolverDependent`], so the reconciler can
//! keep them in a single registry and resolve them by kind and role.

pub mod config_map;
pub mod deployment;
pub mod error;
pub mod queue;
pub mod scaled_object;
pub mod trigger_auth;

pub use config_map::ConfigMapDependent;
pub use deployment::DeploymentDependent;
pub use error::DependentError;
pub use queue::QueueDependent;
pub use scaled_object::ScaledObjectDependent;
pub use trigger_auth::TriggerAuthDependent;

use crate::cluster::{ApplyOutcome, InMemoryCluster};
use crate::model::{ClusterObject, Solver};
use operator_framework::DependentResource;
use tracing::{debug, info};

/// The capability every solver dependent exposes.
pub type SolverDependent =
    dyn DependentResource<Solver, Secondary = ClusterObject, Error = DependentError>;

/// Applies `desired` and logs what changed.
pub(crate) fn apply_desired(
    cluster: &InMemoryCluster,
    dependent: &'static str,
    solver: &Solver,
    desired: ClusterObject,
) -> Result<(), DependentError> {
    let object = desired.metadata().name.clone();
    match cluster.apply(desired)? {
        ApplyOutcome::Unchanged => {
            debug!(dependent, solver = solver.name(), %object, "Already converged");
        }
        outcome => {
            info!(dependent, solver = solver.name(), %object, ?outcome, "Converged");
        }
    }
    Ok(())
}
