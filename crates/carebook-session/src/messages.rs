//! Assistant-authored text for booking sessions.
//!
//! Every entry the session writes on its own behalf (as opposed to relaying
//! a collaborator's message) is composed here.

use crate::types::{BookingReceipt, SlotCandidate, SlotKind, TriageResult};

/// Shown once the clarification streak reaches the configured threshold.
pub const CLARIFY_HINT: &str = "Tip: it helps to mention **where** it hurts, what the pain \
**feels like** (sharp, dull, throbbing), **how long** it has been going on, and anything \
you can **see** such as swelling, bleeding, or a broken tooth.";

const NO_MATCH_FALLBACK: &str =
    "I couldn't match that to a treatment yet. Could you describe your symptoms in a bit more detail?";

// =============================================================================
// MessageComposer
// =============================================================================

/// Composes assistant entries.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    clinic_name: String,
}

impl MessageComposer {
    pub fn new(clinic_name: impl Into<String>) -> Self {
        Self {
            clinic_name: clinic_name.into(),
        }
    }

    /// Opening entry; addresses the patient by name when one is known.
    pub fn greeting(&self, name: Option<&str>) -> String {
        let salutation = match name {
            Some(name) => format!("Hello, **{}**!", name),
            None => "Hello!".to_string(),
        };
        format!(
            "{} Welcome to {}. Tell me what's bothering you and I'll find the right appointment.",
            salutation, self.clinic_name
        )
    }

    pub fn clarify_hint(&self) -> &'static str {
        CLARIFY_HINT
    }

    /// Relays the collaborator's text, or a fallback when it sent none.
    pub fn no_match(&self, message: &str) -> String {
        if message.trim().is_empty() {
            NO_MATCH_FALLBACK.to_string()
        } else {
            message.to_string()
        }
    }

    pub fn analysis_complete(&self, message: &str, triage: &TriageResult) -> String {
        let mut text = String::new();
        if !message.trim().is_empty() {
            text.push_str(message.trim());
            text.push_str("\n\n");
        }
        text.push_str(&format!(
            "Analysis complete: **{}** with a {} specialist, about {} minutes in total.",
            triage.procedure_name,
            triage.specialist_type,
            triage.total_minutes()
        ));
        if triage.requires_sedation {
            text.push_str(" Sedation will be arranged.");
        }
        text.push_str(" Searching for available times...");
        text
    }

    pub fn slots_offered(&self, count: usize, note: Option<&str>) -> String {
        let mut text = if count == 1 {
            "I found **1** available time. Tap it to continue.".to_string()
        } else {
            format!("I found **{}** available times. Pick the one that suits you.", count)
        };
        append_note(&mut text, note);
        text
    }

    pub fn no_slots(&self, note: Option<&str>) -> String {
        let mut text = format!(
            "Sorry, there are no available times for this treatment right now. \
             You can try again shortly or contact {} directly.",
            self.clinic_name
        );
        append_note(&mut text, note);
        text
    }

    pub fn confirm_prompt(&self, slot: &SlotCandidate) -> String {
        format!(
            "You picked {}. Shall I book it?",
            describe_slot(slot)
        )
    }

    pub fn adjust_prompt(&self) -> String {
        "No problem. Choose a different time from the list.".to_string()
    }

    pub fn booked(&self, slot: &SlotCandidate, receipt: &BookingReceipt) -> String {
        let mut text = format!("Your appointment is **confirmed**: {}.", describe_slot(slot));
        if let Some(reference) = receipt.reference.as_deref() {
            text.push_str(&format!(" Reference: {}.", reference));
        }
        text
    }

    pub fn booking_failed(&self) -> String {
        "Sorry, I couldn't complete the booking. Please try confirming again, or pick another time."
            .to_string()
    }

    pub fn missing_procedure(&self) -> String {
        "I don't have a treatment on file for this booking, so I can't confirm it yet.".to_string()
    }

    pub fn triage_failed(&self) -> String {
        "Sorry, something went wrong while reviewing your symptoms. Please send your message again."
            .to_string()
    }

    pub fn search_failed(&self) -> String {
        "Sorry, I couldn't look up available times just now. Please try again in a moment."
            .to_string()
    }
}

/// "Dr. Kim on Tue 20 Oct at 09:00 (consult + treatment, 60 min)".
pub fn describe_slot(slot: &SlotCandidate) -> String {
    let shape = match slot.kind {
        SlotKind::Combo => "consult + treatment, ",
        SlotKind::Single => "",
    };
    format!(
        "**{}** on **{}** at **{}** ({}{} min)",
        slot.doctor_name,
        slot.date.format("%a %d %b"),
        slot.start_time.format("%H:%M"),
        shape,
        slot.duration_minutes
    )
}

fn append_note(text: &mut String, note: Option<&str>) {
    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        text.push('\n');
        text.push_str(note);
    }
}
