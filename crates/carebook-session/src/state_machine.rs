//! Booking step machine with validated transitions.
//!
//! Welcome -> Triage -> Slots -> Confirm -> Done -> Triage
//! Triage -> Confirm (emergency preemption)
//! Confirm -> Slots (adjust)

use crate::error::SessionError;
use crate::types::{SessionAction, SessionStep};

/// Validate that a step transition is allowed.
///
/// Valid transitions:
/// - Welcome -> Triage
/// - Triage -> Triage (greeting, clarification, no match, empty search)
/// - Triage -> Slots
/// - Triage -> Confirm (emergency slot)
/// - Slots -> Confirm
/// - Confirm -> Slots
/// - Confirm -> Confirm (booking failed)
/// - Confirm -> Done
/// - Done -> Triage (new booking)
pub fn validate_transition(from: SessionStep, to: SessionStep) -> Result<(), SessionError> {
    let valid = matches!(
        (from, to),
        (SessionStep::Welcome, SessionStep::Triage)
            | (SessionStep::Triage, SessionStep::Triage)
            | (SessionStep::Triage, SessionStep::Slots)
            | (SessionStep::Triage, SessionStep::Confirm)
            | (SessionStep::Slots, SessionStep::Confirm)
            | (SessionStep::Confirm, SessionStep::Slots)
            | (SessionStep::Confirm, SessionStep::Confirm)
            | (SessionStep::Confirm, SessionStep::Done)
            | (SessionStep::Done, SessionStep::Triage)
    );

    if valid {
        Ok(())
    } else {
        Err(SessionError::InvalidTransition(from, to))
    }
}

/// The only step in which `action` may be taken.
pub fn step_for(action: SessionAction) -> SessionStep {
    match action {
        SessionAction::SubmitText | SessionAction::RetrySearch => SessionStep::Triage,
        SessionAction::SelectSlot => SessionStep::Slots,
        SessionAction::AdjustSlot | SessionAction::ConfirmBooking => SessionStep::Confirm,
        SessionAction::NewBooking => SessionStep::Done,
    }
}

/// Check that `action` is accepted while the session is at `step`.
pub fn validate_action(action: SessionAction, step: SessionStep) -> Result<(), SessionError> {
    if step_for(action) == step {
        Ok(())
    } else {
        Err(SessionError::NotAllowed { action, step })
    }
}
