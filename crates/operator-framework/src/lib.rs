//! # Operator Framework
//!
//! This crate provides the building blocks for level-triggered reconciliation
//! controllers: a user-declared **primary** resource is driven toward its desired state
//! by converging a set of **dependent** (secondary) resources it owns, and the outcome is
//! written back as the primary's status.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Resource Layer** ([`PrimaryResource`], [`DependentResource`]) - your domain
//!    objects and how each owned resource converges
//! 2. **Reconcile Layer** ([`Reconciler`]) - the control loop that orders dependents and
//!    renders a status
//! 3. **Runtime Layer** ([`Controller`], [`ControllerHandle`]) - queues, per-primary
//!    serialization, retry with backoff, event-source matching and status write-back
//!
//! You write the control loop **once** in a `Reconciler`; the controller handles the
//! scheduling and guarantees exactly one status write per invocation.
//!
//! ## Concurrency Model
//!
//! - The controller runs in its own Tokio task and only dispatches
//! - Each primary identity gets a worker task; its reconciles run **sequentially**
//! - Different primaries reconcile in **parallel**
//! - A reconciler never retries; a failed attempt is retried by its worker after
//!   an exponential backoff ([`ControllerConfig::backoff`])
//!
//! ## Level-Triggered Semantics
//!
//! A reconcile may run any number of times for the same snapshot. Dependents must be
//! idempotent, and absence of a secondary resource is a normal transient state, not an
//! error. Change notifications for owned resources ([`ResourceEvent`]) re-enqueue the
//! owner when they match one of the reconciler's [`EventSource`]s.
//!
//! ## Testing
//!
//! The [`mock`] module provides `MockDependent`, a scriptable in-memory dependent, and
//! [`InMemoryStatusStore`] records every status write.

pub mod config;
pub mod controller;
pub mod dependent;
pub mod error;
pub mod event_source;
pub mod message;
pub mod mock;
pub mod reconciler;
pub mod resource;
pub mod status;
pub mod tracing;

// Re-export core types for convenience
pub use config::ControllerConfig;
pub use controller::{Controller, ControllerHandle};
pub use dependent::{Context, DependentResource};
pub use error::FrameworkError;
pub use event_source::{EventSource, EventSourceContext, EventSources, LabelSelector, ResourceEvent};
pub use message::{ControllerRequest, Response};
pub use reconciler::Reconciler;
pub use resource::{ObjectMeta, ObjectRef, OwnerReference, PrimaryResource};
pub use status::{InMemoryStatusStore, StatusWriter};
