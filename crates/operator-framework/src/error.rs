//! # Framework Errors
//!
//! Errors raised by the controller plumbing itself. Reconciler and dependent failures
//! are not wrapped here: they surface as an error status written through the
//! [`Reconciler::error_status`](crate::Reconciler::error_status) hook.

/// Errors that can occur within the operator framework itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FrameworkError {
    #[error("Controller closed")]
    ControllerClosed,
    #[error("Controller dropped response channel")]
    ControllerDropped,
    #[error("Invalid label selector: {0}")]
    InvalidSelector(String),
    #[error("Duplicate event source name: {0}")]
    DuplicateEventSource(String),
    #[error("Invalid controller configuration: {0}")]
    InvalidConfig(String),
    #[error("Status write failed for {object}: {reason}")]
    StatusWrite { object: String, reason: String },
}
