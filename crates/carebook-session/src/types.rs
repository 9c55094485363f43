//! Data model for booking sessions.
//!
//! Conversation entries, triage results, slot candidates, and the
//! action-tagged triage outcome returned by the triage collaborator.

use carebook_core::types::{PatientIdentity, SessionId, Timestamp};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Protocol step of a booking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStep {
    Welcome,
    Triage,
    Slots,
    Confirm,
    Done,
}

impl fmt::Display for SessionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStep::Welcome => write!(f, "welcome"),
            SessionStep::Triage => write!(f, "triage"),
            SessionStep::Slots => write!(f, "slots"),
            SessionStep::Confirm => write!(f, "confirm"),
            SessionStep::Done => write!(f, "done"),
        }
    }
}

/// User-initiated actions a session accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    SubmitText,
    SelectSlot,
    AdjustSlot,
    ConfirmBooking,
    NewBooking,
    RetrySearch,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionAction::SubmitText => write!(f, "submit_text"),
            SessionAction::SelectSlot => write!(f, "select_slot"),
            SessionAction::AdjustSlot => write!(f, "adjust_slot"),
            SessionAction::ConfirmBooking => write!(f, "confirm_booking"),
            SessionAction::NewBooking => write!(f, "new_booking"),
            SessionAction::RetrySearch => write!(f, "retry_search"),
        }
    }
}

/// Who authored a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Speaker {
    Assistant,
    User,
}

/// Shape of a bookable offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotKind {
    /// One provider, one segment.
    Single,
    /// Linked segments (e.g. consult + treatment) booked as a unit.
    Combo,
}

// =============================================================================
// Clinical need and offers
// =============================================================================

/// The classified clinical need.
///
/// Only a result carrying `procedure_id` can proceed to slot search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageResult {
    #[serde(default)]
    pub procedure_id: Option<u64>,
    pub procedure_name: String,
    pub specialist_type: String,
    pub treatment_minutes: u32,
    pub consult_minutes: u32,
    pub requires_sedation: bool,
    #[serde(rename = "roomCapabilityFlag")]
    pub room_capability_required: bool,
}

impl TriageResult {
    pub fn is_routable(&self) -> bool {
        self.procedure_id.is_some()
    }

    pub fn total_minutes(&self) -> u32 {
        self.treatment_minutes + self.consult_minutes
    }
}

/// One bookable appointment offer.
///
/// Selection compares against the offered list by value, never by a derived
/// key. `rank_score` is display-only; offers keep the order the search
/// collaborator returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotCandidate {
    pub kind: SlotKind,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: u32,
    pub doctor_id: u64,
    pub doctor_name: String,
    pub room_id: u64,
    pub room_name: String,
    pub clinic_id: u64,
    #[serde(default)]
    pub staff_id: Option<u64>,
    #[serde(default)]
    pub staff_name: Option<String>,
    pub procedure_label: String,
    #[serde(default)]
    pub rank_score: f64,
}

// `rank_score` compares bitwise so a NaN score still equals itself.
impl PartialEq for SlotCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.date == other.date
            && self.start_time == other.start_time
            && self.end_time == other.end_time
            && self.duration_minutes == other.duration_minutes
            && self.doctor_id == other.doctor_id
            && self.doctor_name == other.doctor_name
            && self.room_id == other.room_id
            && self.room_name == other.room_name
            && self.clinic_id == other.clinic_id
            && self.staff_id == other.staff_id
            && self.staff_name == other.staff_name
            && self.procedure_label == other.procedure_label
            && self.rank_score.to_bits() == other.rank_score.to_bits()
    }
}

/// Slot search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSearchResult {
    #[serde(default)]
    pub combo_slots: Vec<SlotCandidate>,
    #[serde(default)]
    pub single_slots: Vec<SlotCandidate>,
    #[serde(default)]
    pub note: Option<String>,
}

impl SlotSearchResult {
    /// Combo offers first, then single offers, each in service order.
    pub fn merged(&self) -> Vec<SlotCandidate> {
        self.combo_slots
            .iter()
            .chain(self.single_slots.iter())
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.combo_slots.is_empty() && self.single_slots.is_empty()
    }
}

/// Acknowledgement from the booking collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    #[serde(default)]
    pub reference: Option<String>,
}

// =============================================================================
// Triage outcome
// =============================================================================

/// Action-tagged result of analysing one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriageOutcome {
    /// Small talk with no clinical content.
    Greet { message: String },
    /// The classifier needs more detail.
    Clarify { message: String },
    /// Urgent case; may carry a slot held on the priority channel.
    Emergency {
        message: String,
        #[serde(default)]
        triage: Option<TriageResult>,
        #[serde(default, rename = "emergencySlot")]
        emergency_slot: Option<SlotCandidate>,
    },
    /// Classified to a procedure, or not classifiable when `triage` is absent.
    #[serde(rename = "ROUTE")]
    Routed {
        #[serde(default)]
        message: String,
        #[serde(default)]
        triage: Option<TriageResult>,
    },
}

impl TriageOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TriageOutcome::Greet { .. } => "greet",
            TriageOutcome::Clarify { .. } => "clarify",
            TriageOutcome::Emergency { .. } => "emergency",
            TriageOutcome::Routed { .. } => "route",
        }
    }
}

// =============================================================================
// Conversation log
// =============================================================================

/// One turn in the dialogue. Entries are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub id: Uuid,
    pub speaker: Speaker,
    /// Display text; may contain `**emphasis**` markup.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_slots: Option<Vec<SlotCandidate>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_emergency: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_emergency_slot: Option<SlotCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_triage: Option<TriageResult>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub booked: bool,
    pub created_at: Timestamp,
}

impl ConversationEntry {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker,
            text: text.into(),
            attached_slots: None,
            is_emergency: false,
            attached_emergency_slot: None,
            attached_triage: None,
            booked: false,
            created_at: Timestamp::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    pub fn with_slots(mut self, slots: Vec<SlotCandidate>) -> Self {
        self.attached_slots = Some(slots);
        self
    }

    pub fn with_triage(mut self, triage: Option<TriageResult>) -> Self {
        self.attached_triage = triage;
        self
    }

    pub fn with_emergency_slot(mut self, slot: Option<SlotCandidate>) -> Self {
        self.attached_emergency_slot = slot;
        self
    }

    pub fn emergency(mut self) -> Self {
        self.is_emergency = true;
        self
    }

    pub fn booked(mut self) -> Self {
        self.booked = true;
        self
    }}

// =============================================================================
// Views
// =============================================================================

/// Owned copy of a session's state and log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub patient: PatientIdentity,
    pub step: SessionStep,
    pub clarification_streak: u32,
    pub active_triage: Option<TriageResult>,
    pub selected_slot: Option<SlotCandidate>,
    pub offered_slots: Vec<SlotCandidate>,
    pub busy: bool,
    pub entries: Vec<ConversationEntry>,
}

/// One line in a session listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub patient_id: String,
    pub step: SessionStep,
    pub entry_count: usize,
    pub started_at: Timestamp,
}
