//! Error types for the solver reconciler.

use super::DependentKey;
use crate::dependents::DependentError;
use thiserror::Error;

/// Errors that end a reconcile pass early.
///
/// A missing secondary resource is not an error; it only makes the pass not ready.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// A dependent failed to converge. Later steps of the pass did not run.
    #[error("failed to converge {step}")]
    Convergence {
        step: &'static str,
        #[source]
        source: DependentError,
    },

    /// The plan names a dependent that was never registered.
    #[error("no dependent registered for {0}")]
    UnregisteredDependent(DependentKey),

    /// The pass reached a state its own rules exclude.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// The plan failed validation.
    #[error("invalid reconcile plan: {0}")]
    InvalidPlan(String),
}
