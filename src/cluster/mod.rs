//! # In-Memory Cluster
//!
//! A strongly consistent, in-process store for the objects a solver owns. It stands in
//! for the orchestrator API: dependents apply their desired objects to it and read
//! them back, and every change is broadcast as a
//! [`ResourceEvent`](operator_framework::ResourceEvent) for the controller's event
//! sources.
//!
//! Writes are read-after-write consistent: an object applied by a dependent is visible
//! to the very next lookup. Tests can make applies of one kind fail to simulate a
//! backend rejecting an object.

pub mod error;

pub use error::*;

use crate::model::{ClusterObject, ResourceKind};
use operator_framework::{LabelSelector, ObjectRef, ResourceEvent};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;

/// Result of an [`InMemoryCluster::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Default)]
struct ClusterState {
    objects: BTreeMap<(ResourceKind, ObjectRef), ClusterObject>,
    failures: HashMap<ResourceKind, String>,
    unavailable: Option<String>,
}

/// Shared handle to the in-memory cluster. Clones see the same objects.
#[derive(Debug, Clone)]
pub struct InMemoryCluster {
    state: Arc<Mutex<ClusterState>>,
    events: broadcast::Sender<ResourceEvent>,
}

impl Default for InMemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCluster {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            state: Arc::new(Mutex::new(ClusterState::default())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates the object or replaces it when it differs from the stored one.
    pub fn apply(&self, object: ClusterObject) -> Result<ApplyOutcome, ClusterError> {
        let kind = object.kind();
        let object_ref = object.metadata().object_ref();
        let mut state = self.lock();

        if let Some(reason) = &state.unavailable {
            return Err(ClusterError::Unavailable(reason.clone()));
        }
        if let Some(reason) = state.failures.get(&kind) {
            return Err(ClusterError::Rejected {
                kind,
                object: object_ref,
                reason: reason.clone(),
            });
        }

        let key = (kind, object_ref.clone());
        let outcome = match state.objects.get(&key) {
            Some(existing) if *existing == object => ApplyOutcome::Unchanged,
            Some(_) => ApplyOutcome::Updated,
            None => ApplyOutcome::Created,
        };
        if outcome != ApplyOutcome::Unchanged {
            let event = Self::event_for(&object);
            state.objects.insert(key, object);
            drop(state);
            debug!(%kind, object = %object_ref, ?outcome, "Applied");
            let _ = self.events.send(event);
        }
        Ok(outcome)
    }

    pub fn get(&self, kind: ResourceKind, object: &ObjectRef) -> Option<ClusterObject> {
        self.lock().objects.get(&(kind, object.clone())).cloned()
    }

    /// First object of `kind` owned by `owner` whose labels match `selector`.
    pub fn find_owned(
        &self,
        kind: ResourceKind,
        owner_kind: &str,
        owner: &ObjectRef,
        selector: &LabelSelector,
    ) -> Option<ClusterObject> {
        self.lock()
            .objects
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, object)| object)
            .find(|object| {
                let meta = object.metadata();
                meta.is_owned_by(owner_kind, owner) && selector.matches(&meta.labels)
            })
            .cloned()
    }

    pub fn list(&self, kind: ResourceKind) -> Vec<ClusterObject> {
        self.lock()
            .objects
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, object)| object.clone())
            .collect()
    }

    pub fn delete(&self, kind: ResourceKind, object: &ObjectRef) -> Option<ClusterObject> {
        let removed = self.lock().objects.remove(&(kind, object.clone()));
        if let Some(removed) = &removed {
            let _ = self.events.send(Self::event_for(removed));
        }
        removed
    }

    /// Every following apply of `kind` is rejected with `reason`.
    pub fn fail_applies(&self, kind: ResourceKind, reason: impl Into<String>) {
        self.lock().failures.insert(kind, reason.into());
    }

    /// Every following apply fails as if the cluster could not be reached.
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        self.lock().unavailable = Some(reason.into());
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failures.clear();
        state.unavailable = None;
    }

    /// Change notifications for every created, updated or deleted object.
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent> {
        self.events.subscribe()
    }

    fn event_for(object: &ClusterObject) -> ResourceEvent {
        let meta = object.metadata();
        ResourceEvent {
            kind: object.kind().as_str().to_string(),
            object: meta.object_ref(),
            labels: meta.labels.clone(),
            owner: meta.owner.clone(),
        }
    }
}
