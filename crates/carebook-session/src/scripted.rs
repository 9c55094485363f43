//! Scripted collaborators.
//!
//! Replay queued responses and record every call. Used by the terminal
//! driver (loaded from a JSON [`Script`]) and throughout the tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use carebook_core::error::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::error::ServiceError;
use crate::service::{BookingService, Collaborators, SlotSearchService, TriageService};
use crate::types::{BookingReceipt, ConversationEntry, SlotCandidate, SlotSearchResult, TriageOutcome};

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Optional hold applied before a scripted response is released.
#[derive(Default)]
struct Hold {
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
}

impl Hold {
    async fn wait(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

// =============================================================================
// Triage
// =============================================================================

/// A recorded triage request.
#[derive(Debug, Clone)]
pub struct TriageCall {
    pub text: String,
    pub history: Vec<ConversationEntry>,
}

/// Triage collaborator that replays queued outcomes in order.
///
/// Fails with `Unavailable` once the queue is exhausted.
#[derive(Default)]
pub struct ScriptedTriage {
    responses: Mutex<VecDeque<std::result::Result<TriageOutcome, ServiceError>>>,
    calls: Mutex<Vec<TriageCall>>,
    hold: Hold,
}

impl ScriptedTriage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: impl IntoIterator<Item = TriageOutcome>) -> Self {
        let triage = Self::new();
        for outcome in outcomes {
            triage.push(outcome);
        }
        triage
    }

    /// Block each response until `gate` is notified.
    pub fn held_by(mut self, gate: Arc<Notify>) -> Self {
        self.hold.gate = Some(gate);
        self
    }

    pub fn push(&self, outcome: TriageOutcome) {
        guard(&self.responses).push_back(Ok(outcome));
    }

    pub fn push_failure(&self, err: ServiceError) {
        guard(&self.responses).push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<TriageCall> {
        guard(&self.calls).clone()
    }

    pub fn remaining(&self) -> usize {
        guard(&self.responses).len()
    }
}

#[async_trait]
impl TriageService for ScriptedTriage {
    async fn analyze(
        &self,
        text: &str,
        history: &[ConversationEntry],
    ) -> std::result::Result<TriageOutcome, ServiceError> {
        guard(&self.calls).push(TriageCall {
            text: text.to_string(),
            history: history.to_vec(),
        });
        self.hold.wait().await;
        guard(&self.responses).pop_front().unwrap_or_else(|| {
            Err(ServiceError::Unavailable(
                "triage script exhausted".to_string(),
            ))
        })
    }
}

// =============================================================================
// Slot search
// =============================================================================

/// A recorded slot search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchCall {
    pub procedure_id: u64,
    pub requires_sedation: bool,
}

/// Slot search collaborator that replays queued results.
///
/// Returns an empty result once the queue is exhausted.
#[derive(Default)]
pub struct ScriptedSlotSearch {
    responses: Mutex<VecDeque<std::result::Result<SlotSearchResult, ServiceError>>>,
    calls: Mutex<Vec<SearchCall>>,
    hold: Hold,
}

impl ScriptedSlotSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: impl IntoIterator<Item = SlotSearchResult>) -> Self {
        let search = Self::new();
        for result in results {
            search.push(result);
        }
        search
    }

    /// Sleep for `delay` before answering each request.
    pub fn delayed_by(mut self, delay: Duration) -> Self {
        self.hold.delay = Some(delay);
        self
    }

    pub fn push(&self, result: SlotSearchResult) {
        guard(&self.responses).push_back(Ok(result));
    }

    pub fn push_failure(&self, err: ServiceError) {
        guard(&self.responses).push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<SearchCall> {
        guard(&self.calls).clone()
    }
}

#[async_trait]
impl SlotSearchService for ScriptedSlotSearch {
    async fn search(
        &self,
        procedure_id: u64,
        requires_sedation: bool,
    ) -> std::result::Result<SlotSearchResult, ServiceError> {
        guard(&self.calls).push(SearchCall {
            procedure_id,
            requires_sedation,
        });
        self.hold.wait().await;
        guard(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok(SlotSearchResult::default()))
    }
}

// =============================================================================
// Booking
// =============================================================================

/// A recorded booking request.
#[derive(Debug, Clone)]
pub struct BookingCall {
    pub patient_id: String,
    pub procedure_id: u64,
    pub slot: SlotCandidate,
}

/// Booking collaborator that succeeds unless a failure is queued.
#[derive(Default)]
pub struct ScriptedBooking {
    failures: Mutex<VecDeque<ServiceError>>,
    calls: Mutex<Vec<BookingCall>>,
    hold: Hold,
}

impl ScriptedBooking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block each response until `gate` is notified.
    pub fn held_by(mut self, gate: Arc<Notify>) -> Self {
        self.hold.gate = Some(gate);
        self
    }

    /// Sleep for `delay` after recording each commit, before replying.
    pub fn delayed_by(mut self, delay: Duration) -> Self {
        self.hold.delay = Some(delay);
        self
    }

    pub fn push_failure(&self, err: ServiceError) {
        guard(&self.failures).push_back(err);
    }

    pub fn calls(&self) -> Vec<BookingCall> {
        guard(&self.calls).clone()
    }
}

#[async_trait]
impl BookingService for ScriptedBooking {
    async fn book(
        &self,
        patient_id: &str,
        procedure_id: u64,
        slot: &SlotCandidate,
    ) -> std::result::Result<BookingReceipt, ServiceError> {
        let attempt = {
            let mut calls = guard(&self.calls);
            calls.push(BookingCall {
                patient_id: patient_id.to_string(),
                procedure_id,
                slot: slot.clone(),
            });
            calls.len()
        };
        self.hold.wait().await;
        if let Some(err) = guard(&self.failures).pop_front() {
            return Err(err);
        }
        Ok(BookingReceipt {
            reference: Some(format!("APT-{:04}", attempt)),
        })
    }
}

// =============================================================================
// Script
// =============================================================================

/// JSON document bundling responses for all three collaborators.
///
/// ```json
/// {
///   "triage": [{ "action": "GREET", "message": "Hi there!" }],
///   "searches": [{ "comboSlots": [], "singleSlots": [] }],
///   "failingBookings": 0
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    #[serde(default)]
    pub triage: Vec<TriageOutcome>,
    #[serde(default)]
    pub searches: Vec<SlotSearchResult>,
    /// Number of initial booking attempts that fail.
    #[serde(default)]
    pub failing_bookings: u32,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let script = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            triage = script.triage.len(),
            searches = script.searches.len(),
            "Script loaded"
        );
        Ok(script)
    }

    pub fn into_collaborators(self) -> Collaborators {
        let booking = ScriptedBooking::new();
        for _ in 0..self.failing_bookings {
            booking.push_failure(ServiceError::Rejected(
                "scripted booking failure".to_string(),
            ));
        }
        Collaborators::new(
            Arc::new(ScriptedTriage::with_outcomes(self.triage)),
            Arc::new(ScriptedSlotSearch::with_results(self.searches)),
            Arc::new(booking),
        )
    }
}
