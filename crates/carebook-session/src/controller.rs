//! Booking session controller.
//!
//! Owns the conversation log and protocol step for one patient, and drives
//! the triage, slot search, and booking collaborators in response to user
//! actions. At most one collaborator call is outstanding per session; every
//! other action is rejected with [`SessionError::Busy`] until it resolves.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use carebook_core::config::{CarebookConfig, SessionConfig};
use carebook_core::types::{PatientIdentity, SessionId, Timestamp};
use tracing::{debug, info, warn};

use crate::error::{ServiceError, SessionError};
use crate::messages::MessageComposer;
use crate::service::Collaborators;
use crate::state_machine::{validate_action, validate_transition};
use crate::types::{
    ConversationEntry, SessionAction, SessionSnapshot, SessionStep, SlotCandidate,
    SlotSearchResult, TriageOutcome, TriageResult,
};

// =============================================================================
// State
// =============================================================================

struct SessionState {
    step: SessionStep,
    clarification_streak: u32,
    active_triage: Option<TriageResult>,
    selected_slot: Option<SlotCandidate>,
    last_offered_slots: Vec<SlotCandidate>,
    /// Slot held on the priority channel by an emergency classification.
    pending_emergency_slot: Option<SlotCandidate>,
    /// Set when a routed search failed or came back empty.
    search_retry_pending: bool,
    busy: bool,
    entries: Vec<ConversationEntry>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            step: SessionStep::Welcome,
            clarification_streak: 0,
            active_triage: None,
            selected_slot: None,
            last_offered_slots: Vec::new(),
            pending_emergency_slot: None,
            search_retry_pending: false,
            busy: false,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    /// Candidates the user may currently pick from.
    fn offered_slots(&self) -> Vec<SlotCandidate> {
        if self.last_offered_slots.is_empty() {
            self.pending_emergency_slot.iter().cloned().collect()
        } else {
            self.last_offered_slots.clone()
        }
    }
}

/// Clears `busy` when dropped, including when the owning future is dropped
/// mid-call.
struct BusyGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.busy = false;
    }
}

// =============================================================================
// BookingSession
// =============================================================================

/// One patient's booking conversation.
pub struct BookingSession {
    id: SessionId,
    patient: PatientIdentity,
    started_at: Timestamp,
    services: Collaborators,
    config: SessionConfig,
    composer: MessageComposer,
    state: Mutex<SessionState>,
}

impl BookingSession {
    /// Open a session for an authenticated patient and greet them.
    ///
    /// Identities without the patient role never get a session.
    pub fn start(
        patient: PatientIdentity,
        services: Collaborators,
        config: &CarebookConfig,
    ) -> Result<Self, SessionError> {
        if !patient.is_patient() {
            warn!(patient_id = %patient.id, role = %patient.role, "Refusing booking session for non-patient");
            return Err(SessionError::NotAPatient(patient.role));
        }

        let session = Self {
            id: SessionId::new(),
            patient,
            started_at: Timestamp::now(),
            services,
            config: config.session.clone(),
            composer: MessageComposer::new(config.messages.clinic_name.clone()),
            state: Mutex::new(SessionState::new()),
        };

        {
            let mut state = session.lock()?;
            let greeting = session.composer.greeting(session.patient.greeting_name());
            state.push(ConversationEntry::assistant(greeting));
            session.move_to(&mut state, SessionStep::Triage)?;
        }

        info!(session_id = %session.id, patient_id = %session.patient.id, "Booking session started");
        Ok(session)
    }

    // -- User actions --

    /// Send symptom text to triage and apply the classified outcome.
    ///
    /// A routed outcome continues straight into slot search.
    pub async fn submit_text(&self, text: &str) -> Result<SessionStep, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if text.chars().count() > self.config.max_message_length {
            return Err(SessionError::MessageTooLong(self.config.max_message_length));
        }

        let _busy = self.begin(SessionAction::SubmitText)?;

        let history = {
            let state = self.lock()?;
            self.history_window(&state.entries)
        };

        let outcome = self
            .bounded(self.services.triage.analyze(text, &history))
            .await;

        // Logged only once triage answers; a dropped call leaves no trace.
        let routed = {
            let mut state = self.lock()?;
            state.push(ConversationEntry::user(text));
            match outcome {
                Ok(outcome) => self.apply_outcome(&mut state, outcome)?,
                Err(e) => {
                    warn!(session_id = %self.id, error = %e, "Triage call failed");
                    state.push(ConversationEntry::assistant(self.composer.triage_failed()));
                    None
                }
            }
        };

        if let Some(triage) = routed {
            self.run_search(&triage).await?;
        }

        Ok(self.step())
    }

    /// Pick one of the offered candidates.
    ///
    /// `slot` must equal a candidate from the current offer; the stored
    /// selection is that candidate.
    pub fn select_slot(&self, slot: &SlotCandidate) -> Result<SessionStep, SessionError> {
        let _busy = self.begin(SessionAction::SelectSlot)?;
        let mut state = self.lock()?;
        let chosen = state
            .offered_slots()
            .into_iter()
            .find(|candidate| candidate == slot)
            .ok_or(SessionError::UnknownSlot)?;
        self.choose(&mut state, chosen)?;
        Ok(state.step)
    }

    /// Pick the offered candidate at `index` (zero-based, display order).
    pub fn select_slot_at(&self, index: usize) -> Result<SessionStep, SessionError> {
        let _busy = self.begin(SessionAction::SelectSlot)?;
        let mut state = self.lock()?;
        let chosen = state
            .offered_slots()
            .into_iter()
            .nth(index)
            .ok_or(SessionError::SlotIndexOutOfRange(index))?;
        self.choose(&mut state, chosen)?;
        Ok(state.step)
    }

    /// Back out of confirmation to the same candidate list.
    pub fn adjust_slot(&self) -> Result<SessionStep, SessionError> {
        let _busy = self.begin(SessionAction::AdjustSlot)?;
        let mut state = self.lock()?;
        state.selected_slot = None;
        let offered = state.offered_slots();
        state.push(ConversationEntry::assistant(self.composer.adjust_prompt()).with_slots(offered));
        self.move_to(&mut state, SessionStep::Slots)?;
        Ok(state.step)
    }

    /// Commit the selected slot with the booking collaborator.
    ///
    /// On failure the session stays in confirmation with the selection kept.
    /// The commit is always awaited to completion; `service_timeout_secs`
    /// does not apply to it.
    pub async fn confirm_booking(&self) -> Result<SessionStep, SessionError> {
        let _busy = self.begin(SessionAction::ConfirmBooking)?;

        let request = {
            let mut state = self.lock()?;
            let procedure_id = state.active_triage.as_ref().and_then(|t| t.procedure_id);
            match (state.selected_slot.clone(), procedure_id) {
                (Some(slot), Some(procedure_id)) => Some((slot, procedure_id)),
                _ => {
                    warn!(session_id = %self.id, "Confirmation without a bookable procedure");
                    state.push(ConversationEntry::assistant(self.composer.missing_procedure()));
                    None
                }
            }
        };
        let Some((slot, procedure_id)) = request else {
            return Ok(self.step());
        };

        let result = self
            .services
            .booking
            .book(&self.patient.id, procedure_id, &slot)
            .await;

        let mut state = self.lock()?;
        match result {
            Ok(receipt) => {
                info!(
                    session_id = %self.id,
                    procedure_id,
                    reference = ?receipt.reference,
                    "Appointment booked"
                );
                let text = self.composer.booked(&slot, &receipt);
                state.push(ConversationEntry::assistant(text).booked());
                self.move_to(&mut state, SessionStep::Done)?;
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Booking call failed");
                state.push(ConversationEntry::assistant(self.composer.booking_failed()));
                self.move_to(&mut state, SessionStep::Confirm)?;
            }
        }
        Ok(state.step)
    }

    /// Start over after a completed booking with a fresh greeting.
    pub fn new_booking(&self) -> Result<SessionStep, SessionError> {
        let _busy = self.begin(SessionAction::NewBooking)?;
        let mut state = self.lock()?;
        state.clarification_streak = 0;
        state.active_triage = None;
        state.selected_slot = None;
        state.last_offered_slots.clear();
        state.pending_emergency_slot = None;
        state.search_retry_pending = false;
        state.entries = vec![ConversationEntry::assistant(
            self.composer.greeting(self.patient.greeting_name()),
        )];
        self.move_to(&mut state, SessionStep::Triage)?;
        Ok(state.step)
    }

    /// Search again for the procedure already classified, after a failed or
    /// empty search, without re-running triage.
    pub async fn retry_search(&self) -> Result<SessionStep, SessionError> {
        let _busy = self.begin(SessionAction::RetrySearch)?;
        let triage = {
            let state = self.lock()?;
            if !state.search_retry_pending {
                return Err(SessionError::NoRoutableTriage);
            }
            state
                .active_triage
                .clone()
                .filter(TriageResult::is_routable)
                .ok_or(SessionError::NoRoutableTriage)?
        };
        self.run_search(&triage).await?;
        Ok(self.step())
    }

    // -- Read access --

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn patient(&self) -> &PatientIdentity {
        &self.patient
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn step(&self) -> SessionStep {
        self.read().step
    }

    pub fn clarification_streak(&self) -> u32 {
        self.read().clarification_streak
    }

    pub fn active_triage(&self) -> Option<TriageResult> {
        self.read().active_triage.clone()
    }

    pub fn selected_slot(&self) -> Option<SlotCandidate> {
        self.read().selected_slot.clone()
    }

    pub fn offered_slots(&self) -> Vec<SlotCandidate> {
        self.read().offered_slots()
    }

    pub fn is_busy(&self) -> bool {
        self.read().busy
    }

    pub fn entries(&self) -> Vec<ConversationEntry> {
        self.read().entries.clone()
    }

    pub fn entry_count(&self) -> usize {
        self.read().entries.len()
    }

    pub fn last_entry(&self) -> Option<ConversationEntry> {
        self.read().entries.last().cloned()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.read();
        SessionSnapshot {
            session_id: self.id,
            patient: self.patient.clone(),
            step: state.step,
            clarification_streak: state.clarification_streak,
            active_triage: state.active_triage.clone(),
            selected_slot: state.selected_slot.clone(),
            offered_slots: state.offered_slots(),
            busy: state.busy,
            entries: state.entries.clone(),
        }
    }

    // -- Private helpers --

    fn lock(&self) -> Result<MutexGuard<'_, SessionState>, SessionError> {
        self.state
            .lock()
            .map_err(|e| SessionError::LockPoisoned(e.to_string()))
    }

    fn read(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit `action` if the session is idle and at the right step, and mark
    /// it busy until the returned guard drops.
    fn begin(&self, action: SessionAction) -> Result<BusyGuard<'_>, SessionError> {
        let mut state = self.lock()?;
        if state.busy {
            debug!(session_id = %self.id, %action, "Action rejected while busy");
            return Err(SessionError::Busy);
        }
        if let Err(e) = validate_action(action, state.step) {
            debug!(session_id = %self.id, %action, step = %state.step, "Action rejected");
            return Err(e);
        }
        state.busy = true;
        Ok(BusyGuard { state: &self.state })
    }

    fn move_to(&self, state: &mut SessionState, to: SessionStep) -> Result<(), SessionError> {
        validate_transition(state.step, to)?;
        if state.step != to {
            info!(session_id = %self.id, from = %state.step, to = %to, "Booking step changed");
        }
        state.step = to;
        Ok(())
    }

    /// Entries sent to triage as context, oldest first.
    fn history_window(&self, entries: &[ConversationEntry]) -> Vec<ConversationEntry> {
        let limit = self.config.history_limit;
        let start = if limit == 0 {
            0
        } else {
            entries.len().saturating_sub(limit)
        };
        entries[start..].to_vec()
    }

    /// Apply `service_timeout_secs` to a triage or search call.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ServiceError>>,
    ) -> Result<T, ServiceError> {
        match self.config.service_timeout() {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout(limit.as_secs())),
            },
            None => call.await,
        }
    }

    /// Apply a triage outcome. Returns the triage to search for when the
    /// outcome was routed to a bookable procedure.
    fn apply_outcome(
        &self,
        state: &mut SessionState,
        outcome: TriageOutcome,
    ) -> Result<Option<TriageResult>, SessionError> {
        let action = outcome.label();
        state.search_retry_pending = false;

        match outcome {
            TriageOutcome::Greet { message } => {
                state.clarification_streak = 0;
                state.push(ConversationEntry::assistant(message));
                self.move_to(state, SessionStep::Triage)?;
            }
            TriageOutcome::Clarify { message } => {
                state.clarification_streak += 1;
                state.push(ConversationEntry::assistant(message));
                if state.clarification_streak >= self.config.clarify_hint_threshold {
                    state.push(ConversationEntry::assistant(self.composer.clarify_hint()));
                }
                self.move_to(state, SessionStep::Triage)?;
            }
            TriageOutcome::Emergency {
                message,
                triage,
                emergency_slot,
            } => {
                state.clarification_streak = 0;
                state.active_triage = triage.clone();
                state.push(
                    ConversationEntry::assistant(message)
                        .emergency()
                        .with_triage(triage)
                        .with_emergency_slot(emergency_slot.clone()),
                );
                match emergency_slot {
                    Some(slot) => {
                        state.last_offered_slots.clear();
                        state.pending_emergency_slot = Some(slot.clone());
                        state.selected_slot = Some(slot);
                        self.move_to(state, SessionStep::Confirm)?;
                    }
                    None => self.move_to(state, SessionStep::Triage)?,
                }
            }
            TriageOutcome::Routed {
                message,
                triage: Some(triage),
            } if triage.is_routable() => {
                state.clarification_streak = 0;
                state.active_triage = Some(triage.clone());
                let summary = self.composer.analysis_complete(&message, &triage);
                state.push(ConversationEntry::assistant(summary).with_triage(Some(triage.clone())));
                info!(
                    session_id = %self.id,
                    action,
                    procedure_id = ?triage.procedure_id,
                    "Triage routed to procedure"
                );
                return Ok(Some(triage));
            }
            TriageOutcome::Routed { message, .. } => {
                state.clarification_streak = 0;
                state.push(ConversationEntry::assistant(self.composer.no_match(&message)));
                self.move_to(state, SessionStep::Triage)?;
            }
        }

        info!(
            session_id = %self.id,
            action,
            streak = state.clarification_streak,
            step = %state.step,
            "Triage outcome applied"
        );
        Ok(None)
    }

    async fn run_search(&self, triage: &TriageResult) -> Result<(), SessionError> {
        let procedure_id = triage.procedure_id.ok_or(SessionError::NoRoutableTriage)?;
        let result = self
            .bounded(
                self.services
                    .slots
                    .search(procedure_id, triage.requires_sedation),
            )
            .await;

        let mut state = self.lock()?;
        match result {
            Ok(found) => self.apply_search(&mut state, found),
            Err(e) => {
                warn!(session_id = %self.id, procedure_id, error = %e, "Slot search failed");
                state.search_retry_pending = true;
                state.push(ConversationEntry::assistant(self.composer.search_failed()));
                self.move_to(&mut state, SessionStep::Triage)
            }
        }
    }

    fn apply_search(
        &self,
        state: &mut SessionState,
        found: SlotSearchResult,
    ) -> Result<(), SessionError> {
        let merged = found.merged();
        let note = found.note.as_deref();

        if merged.is_empty() {
            info!(session_id = %self.id, "Slot search returned no candidates");
            state.search_retry_pending = true;
            state.push(ConversationEntry::assistant(self.composer.no_slots(note)));
            return self.move_to(state, SessionStep::Triage);
        }

        info!(
            session_id = %self.id,
            combo = found.combo_slots.len(),
            single = found.single_slots.len(),
            "Slot candidates offered"
        );
        state.search_retry_pending = false;
        state.pending_emergency_slot = None;
        state.last_offered_slots = merged.clone();
        let text = self.composer.slots_offered(merged.len(), note);
        state.push(ConversationEntry::assistant(text).with_slots(merged));
        self.move_to(state, SessionStep::Slots)
    }

    fn choose(&self, state: &mut SessionState, chosen: SlotCandidate) -> Result<(), SessionError> {
        let prompt = self.composer.confirm_prompt(&chosen);
        state.selected_slot = Some(chosen);
        state.push(ConversationEntry::assistant(prompt));
        self.move_to(state, SessionStep::Confirm)
    }
}
