//! Collaborator traits.
//!
//! The session talks to triage, slot search, and booking only through these
//! traits; transports and algorithms live behind them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::types::{BookingReceipt, ConversationEntry, SlotCandidate, SlotSearchResult, TriageOutcome};

/// Classifies free-text symptoms into an action.
#[async_trait]
pub trait TriageService: Send + Sync {
    /// Analyse `text` in the context of the prior conversation.
    async fn analyze(
        &self,
        text: &str,
        history: &[ConversationEntry],
    ) -> Result<TriageOutcome, ServiceError>;
}

/// Finds candidate appointment slots for a procedure.
#[async_trait]
pub trait SlotSearchService: Send + Sync {
    async fn search(
        &self,
        procedure_id: u64,
        requires_sedation: bool,
    ) -> Result<SlotSearchResult, ServiceError>;
}

/// Commits a reservation.
#[async_trait]
pub trait BookingService: Send + Sync {
    async fn book(
        &self,
        patient_id: &str,
        procedure_id: u64,
        slot: &SlotCandidate,
    ) -> Result<BookingReceipt, ServiceError>;
}

/// The three collaborators a session depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub triage: Arc<dyn TriageService>,
    pub slots: Arc<dyn SlotSearchService>,
    pub booking: Arc<dyn BookingService>,
}

impl Collaborators {
    pub fn new(
        triage: Arc<dyn TriageService>,
        slots: Arc<dyn SlotSearchService>,
        booking: Arc<dyn BookingService>,
    ) -> Self {
        Self {
            triage,
            slots,
            booking,
        }
    }
}
