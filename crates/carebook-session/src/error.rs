//! Error types for booking sessions.

use carebook_core::error::CarebookError;
use carebook_core::types::{PatientRole, SessionId};

use crate::types::{SessionAction, SessionStep};

/// Failures reported by triage, slot search, or booking collaborators.
///
/// The session never branches on the variant; every failure is recovered
/// the same way.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Collaborator call timed out after {0} seconds")]
    Timeout(u64),
}

/// Actions the session refused to perform.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session is busy with an outstanding request")]
    Busy,
    #[error("{action} is not allowed in the {step} step")]
    NotAllowed {
        action: SessionAction,
        step: SessionStep,
    },
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("slot is not among the offered candidates")]
    UnknownSlot,
    #[error("no offered slot at position {0}")]
    SlotIndexOutOfRange(usize),
    #[error("no classified procedure is waiting for a slot search")]
    NoRoutableTriage,
    #[error("invalid step transition: {0} -> {1}")]
    InvalidTransition(SessionStep, SessionStep),
    #[error("identity with role {0} cannot open a booking session")]
    NotAPatient(PatientRole),
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("session lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<SessionError> for CarebookError {
    fn from(err: SessionError) -> Self {
        CarebookError::Session(err.to_string())
    }
}

impl From<ServiceError> for CarebookError {
    fn from(err: ServiceError) -> Self {
        CarebookError::Service(err.to_string())
    }
}
