//! # Solver Operator
//!
//! > **A level-triggered controller for solver deployments.**
//!
//! A [`Solver`](model::Solver) declares a solver image, the message broker it talks to
//! and how it scales. The operator keeps six owned objects convergent with it (a
//! deployment, an input and an output queue, a config map and, when scaling is dynamic,
//! a trigger authentication and a scaled object) and reports the outcome as the
//! solver's status.
//!
//! ## 🏗️ Design
//!
//! ### Level-Triggered Reconcile
//! Every pass starts from the solver snapshot and what the cluster holds right now. It
//! never remembers earlier passes, so running it twice, or after a crash, converges to
//! the same place. A missing object is a normal transient state: the pass reports
//! `Unknown` and the next change event runs it again.
//!
//! ### Steps as Data
//! The order of convergence is a [`ReconcilePlan`](reconciler::ReconcilePlan): named
//! steps with explicit gates, checked once so a gate only reads what an earlier step
//! has observed. Dependents are resolved by `(kind, role)` from a
//! [`DependentRegistry`](reconciler::DependentRegistry).
//!
//! ### Exactly One Status per Pass
//! A pass ends in `Ready`, `Unknown` or `Error`, stamped with the generation it
//! reconciled. Failures become an `Error` status and the controller retries with
//! exponential backoff.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Data ([`model`])
//! The solver resource, its status and the objects it owns.
//!
//! ### 2. The Backend ([`cluster`])
//! A strongly consistent in-memory cluster with label lookup and change notifications.
//!
//! ### 3. The Dependents ([`dependents`])
//! One [`DependentResource`](operator_framework::DependentResource) per owned object.
//!
//! ### 4. The Control Loop ([`reconciler`])
//! Registry, plan, readiness, status rendering and error reporting.
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! [`SolverSystem`](lifecycle::SolverSystem) wires the controller, the cluster and the
//! event forwarding together.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo with debug logs
//! RUST_LOG=debug cargo run
//! ```

pub mod cluster;
pub mod dependents;
pub mod lifecycle;
pub mod model;
pub mod reconciler;

#[cfg(test)]
pub(crate) mod test_support;
