//! # Solver Reconciler
//!
//! The control loop for a [`Solver`](crate::model::Solver). One pass walks the
//! [`ReconcilePlan`], converging each dependent resolved from the [`DependentRegistry`]
//! and reading it back straight away. The read-backs feed the readiness checks and the
//! gates of later steps; the verdict is rendered as the solver's new status.
//!
//! A missing secondary resource only makes the pass not ready. A convergence failure
//! ends the pass and is rendered as an Error status by [`error_reporter`]; retrying is
//! left to the controller.

pub mod error;
pub mod error_reporter;
pub mod orchestrator;
pub mod plan;
pub mod readiness;
pub mod registry;
pub mod status;

pub use error::ReconcileError;
pub use orchestrator::SolverReconciler;
pub use plan::{Gate, ReconcilePlan, Step, WhenSkipped};
pub use readiness::{CheckOutcome, ReadinessCheck, ReadinessChecks};
pub use registry::{DependentKey, DependentRegistry};
