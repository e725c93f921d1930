//! Error types for the solver's dependent resources.

use crate::cluster::ClusterError;
use thiserror::Error;

/// Errors raised while converging one dependent resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DependentError {
    /// The backing cluster refused or could not store the desired object.
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// A resource this dependent derives its desired state from is not present.
    #[error("{dependent} requires the {missing}, which does not exist yet")]
    MissingInput {
        dependent: &'static str,
        missing: String,
    },
}

#[cfg(test)]
impl From<operator_framework::mock::MockError> for DependentError {
    fn from(err: operator_framework::mock::MockError) -> Self {
        DependentError::Cluster(ClusterError::Unavailable(err.0))
    }
}
