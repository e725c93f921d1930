//! # Mock Dependents & Testing Guide
//!
//! `MockDependent<S>` implements [`DependentResource`] entirely in memory. It lets a test
//! script what a dependent observes before and after convergence, inject convergence
//! failures, and assert how often (and in which order) the reconciler called it, without
//! any backing cluster.
//!
//! ## When to use Mocks vs a Real Backend
//!
//! | Feature | MockDependent | Real dependent |
//! |---------|---------------|----------------|
//! | **Speed** | Instant | Depends on the backend |
//! | **Determinism** | Fully scripted | Subject to backend state |
//! | **Use Case** | Ordering, gating and readiness logic of a reconciler | Desired-state computation of the dependent itself |
//! | **Error Injection** | `fail_with` | Requires backend failure injection |
//!
//! ## Example
//!
//! ```rust
//! use operator_framework::mock::{CallLog, MockDependent};
//! use operator_framework::{Context, DependentResource, ObjectMeta, PrimaryResource};
//!
//! #[derive(Clone, Debug)]
//! struct App { metadata: ObjectMeta }
//!
//! impl PrimaryResource for App {
//!     const KIND: &'static str = "App";
//!     type Status = String;
//!     fn metadata(&self) -> &ObjectMeta { &self.metadata }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let log = CallLog::new();
//!     let queue = MockDependent::<String>::new("queue")
//!         .with_call_log(log.clone())
//!         .materializes_as("q-in".to_string());
//!
//!     let app = App { metadata: ObjectMeta::new("ns", "app") };
//!     assert!(DependentResource::<App>::secondary_resource(&queue, &app).is_none());
//!
//!     queue.reconcile(&app, &Context::first_attempt()).await.unwrap();
//!     assert_eq!(DependentResource::<App>::secondary_resource(&queue, &app), Some("q-in".to_string()));
//!     assert_eq!(log.calls(), vec!["queue"]);
//! }
//! ```

use crate::dependent::{Context, DependentResource};
use crate::event_source::{EventSource, EventSourceContext, LabelSelector};
use crate::resource::PrimaryResource;
use async_trait::async_trait;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

/// Error raised by a [`MockDependent`] scripted with [`MockDependent::fail_with`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{0}")]
pub struct MockError(pub String);

/// Shared, ordered record of `reconcile` calls across several mocks.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, name: &str) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(name.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

#[derive(Debug)]
struct MockState<S> {
    observed: Option<S>,
    materializes_as: Option<S>,
    failure: Option<String>,
    reconcile_calls: usize,
}

/// A scriptable dependent resource.
///
/// Clones share state, so a test can keep one clone for assertions and hand the other
/// to the reconciler under test.
#[derive(Debug)]
pub struct MockDependent<S, E = MockError> {
    name: String,
    kind: String,
    selector: LabelSelector,
    log: Option<CallLog>,
    state: Arc<Mutex<MockState<S>>>,
    _error: PhantomData<fn() -> E>,
}

impl<S, E> Clone for MockDependent<S, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind.clone(),
            selector: self.selector.clone(),
            log: self.log.clone(),
            state: self.state.clone(),
            _error: PhantomData,
        }
    }
}

impl<S: Clone, E> MockDependent<S, E> {
    /// Creates a mock with nothing observed that converges without side effects.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: name.clone(),
            name,
            selector: LabelSelector::everything(),
            log: None,
            state: Arc::new(Mutex::new(MockState {
                observed: None,
                materializes_as: None,
                failure: None,
                reconcile_calls: 0,
            })),
            _error: PhantomData,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState<S>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_selector(mut self, selector: LabelSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_call_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// The secondary resource is already observed before any convergence.
    pub fn present(self, secondary: S) -> Self {
        self.lock().observed = Some(secondary);
        self
    }

    /// The secondary resource appears once `reconcile` has been called.
    pub fn materializes_as(self, secondary: S) -> Self {
        self.lock().materializes_as = Some(secondary);
        self
    }

    /// Every `reconcile` call fails with `message` and changes nothing.
    pub fn fail_with(self, message: impl Into<String>) -> Self {
        self.lock().failure = Some(message.into());
        self
    }

    pub fn set_observed(&self, secondary: Option<S>) {
        self.lock().observed = secondary;
    }

    pub fn clear_failure(&self) {
        self.lock().failure = None;
    }

    pub fn reconcile_calls(&self) -> usize {
        self.lock().reconcile_calls
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<P, S, E> DependentResource<P> for MockDependent<S, E>
where
    P: PrimaryResource,
    S: Clone + Send + Sync + Debug + 'static,
    E: From<MockError> + std::error::Error + Send + Sync + 'static,
{
    type Secondary = S;
    type Error = E;

    async fn reconcile(&self, _primary: &P, _ctx: &Context) -> Result<(), Self::Error> {
        if let Some(log) = &self.log {
            log.record(&self.name);
        }
        let mut state = self.lock();
        state.reconcile_calls += 1;
        if let Some(message) = &state.failure {
            return Err(E::from(MockError(message.clone())));
        }
        if let Some(secondary) = state.materializes_as.clone() {
            state.observed = Some(secondary);
        }
        Ok(())
    }

    fn secondary_resource(&self, _primary: &P) -> Option<Self::Secondary> {
        self.lock().observed.clone()
    }

    fn init_event_source(&self, ctx: &EventSourceContext) -> EventSource {
        EventSource::new(self.name.clone(), self.kind.clone())
            .with_selector(self.selector.clone())
            .owned_by(ctx.primary_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ObjectMeta;

    #[derive(Clone, Debug)]
    struct Primary {
        metadata: ObjectMeta,
    }

    impl PrimaryResource for Primary {
        const KIND: &'static str = "Primary";
        type Status = ();
        fn metadata(&self) -> &ObjectMeta {
            &self.metadata
        }
    }

    fn primary() -> Primary {
        Primary {
            metadata: ObjectMeta::new("ns", "p"),
        }
    }

    #[tokio::test]
    async fn failing_mock_records_call_and_keeps_state() {
        let log = CallLog::new();
        let mock: MockDependent<u32> = MockDependent::new("deployment")
            .with_call_log(log.clone())
            .materializes_as(7)
            .fail_with("boom");

        let err = mock
            .reconcile(&primary(), &Context::first_attempt())
            .await
            .unwrap_err();
        assert_eq!(err, MockError("boom".into()));
        assert_eq!(mock.reconcile_calls(), 1);
        assert_eq!(log.calls(), vec!["deployment"]);
        assert_eq!(DependentResource::<Primary>::secondary_resource(&mock, &primary()), None);

        mock.clear_failure();
        mock.reconcile(&primary(), &Context::first_attempt()).await.unwrap();
        assert_eq!(DependentResource::<Primary>::secondary_resource(&mock, &primary()), Some(7));
    }

    #[test]
    fn event_source_uses_name_kind_and_selector() {
        let mock: MockDependent<u32> = MockDependent::new("queue-input")
            .with_kind("MessageQueue")
            .with_selector(LabelSelector::eq("role", "input"));
        let source = DependentResource::<Primary>::init_event_source(
            &mock,
            &EventSourceContext {
                primary_kind: "Primary",
            },
        );
        assert_eq!(source.name(), "queue-input");
        assert_eq!(source.kind(), "MessageQueue");
        assert_eq!(source.selector().to_string(), "role=input");
        assert_eq!(source.owner_kind(), Some("Primary"));
    }
}
