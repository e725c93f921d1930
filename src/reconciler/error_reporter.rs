//! Turns a failed pass into an Error status. Never retries; the controller does.

use crate::model::SolverStatus;
use std::error::Error;
use tracing::warn;

/// The error's message followed by each of its sources, joined with `": "`.
pub fn error_message(error: &(dyn Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub fn on_error(generation: i64, error: &(dyn Error + 'static)) -> SolverStatus {
    let message = error_message(error);
    warn!(generation, error = %message, "Reconcile failed");
    SolverStatus::error(generation, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterError;
    use crate::dependents::DependentError;
    use crate::reconciler::ReconcileError;

    #[test]
    fn message_includes_the_source_chain() {
        let err = ReconcileError::Convergence {
            step: "deployment",
            source: DependentError::Cluster(ClusterError::Unavailable(
                "connection refused".into(),
            )),
        };
        assert_eq!(
            on_error(3, &err),
            SolverStatus::error(
                3,
                "failed to converge deployment: cluster unavailable: connection refused"
            )
        );
    }

    #[test]
    fn error_without_source_is_its_own_message() {
        let err = ReconcileError::ContractViolation("x".into());
        assert_eq!(error_message(&err), "contract violation: x");
    }
}
