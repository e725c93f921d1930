//! Error types for the backing cluster.

use crate::model::ResourceKind;
use operator_framework::ObjectRef;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClusterError {
    /// The cluster refused to store the object.
    #[error("{kind} {object} rejected: {reason}")]
    Rejected {
        kind: ResourceKind,
        object: ObjectRef,
        reason: String,
    },

    /// The cluster could not be reached at all.
    #[error("cluster unavailable: {0}")]
    Unavailable(String),
}
