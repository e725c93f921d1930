//! # Status Write-Back
//!
//! The persistence of a primary's status belongs to the host system of record. The
//! controller only needs a [`StatusWriter`]; [`InMemoryStatusStore`] is provided for
//! tests and for hosts that keep primaries in memory.

use crate::error::FrameworkError;
use crate::resource::{ObjectRef, PrimaryResource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[async_trait]
pub trait StatusWriter<P: PrimaryResource>: Send + Sync + 'static {
    /// Replaces the status of `object`. Never merges with a previous value.
    async fn write_status(&self, object: &ObjectRef, status: P::Status)
        -> Result<(), FrameworkError>;
}

#[derive(Debug)]
struct StoreState<S> {
    statuses: HashMap<ObjectRef, S>,
    history: Vec<(ObjectRef, S)>,
    rejecting: Option<String>,
}

/// Status store keeping the latest status per object and the full write history.
#[derive(Debug)]
pub struct InMemoryStatusStore<P: PrimaryResource> {
    state: Arc<Mutex<StoreState<P::Status>>>,
}

impl<P: PrimaryResource> Clone for InMemoryStatusStore<P> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<P: PrimaryResource> Default for InMemoryStatusStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PrimaryResource> InMemoryStatusStore<P> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                statuses: HashMap::new(),
                history: Vec::new(),
                rejecting: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState<P::Status>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, object: &ObjectRef) -> Option<P::Status> {
        self.lock().statuses.get(object).cloned()
    }

    /// Every status written for `object`, oldest first.
    pub fn history(&self, object: &ObjectRef) -> Vec<P::Status> {
        self.lock()
            .history
            .iter()
            .filter(|(o, _)| o == object)
            .map(|(_, s)| s.clone())
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.lock().history.len()
    }

    /// Every following write fails with `reason` and stores nothing.
    pub fn reject_writes(&self, reason: impl Into<String>) {
        self.lock().rejecting = Some(reason.into());
    }

    pub fn accept_writes(&self) {
        self.lock().rejecting = None;
    }
}

#[async_trait]
impl<P: PrimaryResource> StatusWriter<P> for InMemoryStatusStore<P> {
    async fn write_status(
        &self,
        object: &ObjectRef,
        status: P::Status,
    ) -> Result<(), FrameworkError> {
        let mut state = self.lock();
        if let Some(reason) = &state.rejecting {
            return Err(FrameworkError::StatusWrite {
                object: object.to_string(),
                reason: reason.clone(),
            });
        }
        state.history.push((object.clone(), status.clone()));
        state.statuses.insert(object.clone(), status);
        Ok(())
    }
}
