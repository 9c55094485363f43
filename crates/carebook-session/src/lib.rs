//! Conversational booking session for Carebook.
//!
//! Drives a single patient conversation from free-text symptoms through
//! triage, slot discovery, and appointment confirmation, coordinating the
//! triage, slot search, and booking collaborators.

pub mod controller;
pub mod error;
pub mod messages;
pub mod registry;
pub mod scripted;
pub mod service;
pub mod state_machine;
pub mod types;

pub use controller::BookingSession;
pub use error::{ServiceError, SessionError};
pub use registry::SessionRegistry;
pub use scripted::{Script, ScriptedBooking, ScriptedSlotSearch, ScriptedTriage};
pub use service::{BookingService, Collaborators, SlotSearchService, TriageService};
pub use types::{
    BookingReceipt, ConversationEntry, SessionAction, SessionSnapshot, SessionStep,
    SessionSummary, SlotCandidate, SlotKind, SlotSearchResult, Speaker, TriageOutcome,
    TriageResult,
};
