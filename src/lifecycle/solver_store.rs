//! The system of record for solver resources.
//!
//! Holds the latest snapshot of every applied solver. Status writes from the controller
//! replace the `status` of the stored snapshot and are also recorded in an
//! [`InMemoryStatusStore`] for history.

use crate::model::{Solver, SolverStatus};
use async_trait::async_trait;
use operator_framework::{
    FrameworkError, InMemoryStatusStore, ObjectRef, PrimaryResource, StatusWriter,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Clone, Default)]
pub struct SolverStore {
    solvers: Arc<Mutex<HashMap<ObjectRef, Solver>>>,
    statuses: InMemoryStatusStore<Solver>,
}

impl SolverStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ObjectRef, Solver>> {
        self.solvers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn statuses(&self) -> &InMemoryStatusStore<Solver> {
        &self.statuses
    }

    /// Stores a new snapshot. The status is owned by the controller, so a snapshot
    /// without one keeps the status already stored.
    pub fn upsert(&self, mut solver: Solver) {
        let object = solver.object_ref();
        let mut solvers = self.lock();
        if solver.status.is_none() {
            solver.status = solvers.get(&object).and_then(|stored| stored.status.clone());
        }
        solvers.insert(object, solver);
    }

    pub fn get(&self, object: &ObjectRef) -> Option<Solver> {
        self.lock().get(object).cloned()
    }

    pub fn remove(&self, object: &ObjectRef) -> Option<Solver> {
        self.lock().remove(object)
    }
}

#[async_trait]
impl StatusWriter<Solver> for SolverStore {
    async fn write_status(
        &self,
        object: &ObjectRef,
        status: SolverStatus,
    ) -> Result<(), FrameworkError> {
        self.statuses.write_status(object, status.clone()).await?;
        match self.lock().get_mut(object) {
            Some(solver) => solver.status = Some(status),
            None => debug!(%object, "Status for a solver no longer stored"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::static_solver;

    #[tokio::test]
    async fn status_write_replaces_stored_status() {
        let store = SolverStore::new();
        let solver = static_solver("s", 1);
        let object = solver.object_ref();
        store.upsert(solver.clone());

        store
            .write_status(&object, SolverStatus::Unknown { generation: 1 })
            .await
            .unwrap();
        store
            .write_status(&object, SolverStatus::Unknown { generation: 2 })
            .await
            .unwrap();

        assert_eq!(
            store.get(&object).and_then(|s| s.status),
            Some(SolverStatus::Unknown { generation: 2 })
        );
        assert_eq!(store.statuses().history(&object).len(), 2);

        // A new snapshot from the system of record keeps the written status
        store.upsert(static_solver("s", 3));
        let stored = store.get(&object).unwrap();
        assert_eq!(stored.generation(), 3);
        assert_eq!(stored.status, Some(SolverStatus::Unknown { generation: 2 }));
    }

    #[tokio::test]
    async fn status_of_removed_solver_is_only_recorded() {
        let store = SolverStore::new();
        let object = static_solver("s", 1).object_ref();

        store
            .write_status(&object, SolverStatus::Unknown { generation: 1 })
            .await
            .unwrap();
        assert!(store.get(&object).is_none());
        assert_eq!(
            store.statuses().get(&object),
            Some(SolverStatus::Unknown { generation: 1 })
        );
    }
}
