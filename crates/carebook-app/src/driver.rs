//! Terminal driver for one booking session.
//!
//! Lines starting with `/` are commands; anything else is sent to triage as
//! symptom text.

use carebook_session::messages::describe_slot;
use carebook_session::{BookingSession, ConversationEntry, SessionError, SessionStep, Speaker};

pub const HELP: &str = "Commands: /pick N, /emergency, /adjust, /confirm, /retry, /new, /show, /quit. \
Anything else is sent as a description of your symptoms.";

/// A parsed line of driver input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pick the offered slot at this zero-based index.
    Pick(usize),
    Emergency,
    Adjust,
    Confirm,
    Retry,
    New,
    Show,
    Help,
    Quit,
    Text(String),
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Text(line.to_string());
        };
        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        match name.as_str() {
            "pick" => match parts.next().map(str::parse::<usize>) {
                Some(Ok(n)) if n >= 1 => Command::Pick(n - 1),
                _ => Command::Invalid("usage: /pick N (N starts at 1)".to_string()),
            },
            "emergency" => Command::Emergency,
            "adjust" => Command::Adjust,
            "confirm" => Command::Confirm,
            "retry" => Command::Retry,
            "new" => Command::New,
            "show" => Command::Show,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => Command::Invalid(format!("unknown command: /{}", other)),
        }
    }
}

/// Execute a session-changing command. Display-only commands return `Ok(None)`.
pub async fn execute(
    session: &BookingSession,
    command: &Command,
) -> Result<Option<SessionStep>, SessionError> {
    let step = match command {
        Command::Pick(index) => session.select_slot_at(*index)?,
        Command::Adjust => session.adjust_slot()?,
        Command::Confirm => session.confirm_booking().await?,
        Command::Retry => session.retry_search().await?,
        Command::New => session.new_booking()?,
        Command::Text(text) => session.submit_text(text).await?,
        Command::Emergency
        | Command::Show
        | Command::Help
        | Command::Quit
        | Command::Invalid(_) => return Ok(None),
    };
    Ok(Some(step))
}

/// Render one conversation entry for the terminal.
pub fn render_entry(entry: &ConversationEntry) -> String {
    let speaker = match entry.speaker {
        Speaker::Assistant => "assistant",
        Speaker::User => "you",
    };
    let mut out = String::new();
    if entry.is_emergency {
        out.push_str("[EMERGENCY] ");
    }
    if entry.booked {
        out.push_str("[BOOKED] ");
    }
    out.push_str(&format!("{}> {}", speaker, entry.text));

    if let Some(slot) = &entry.attached_emergency_slot {
        out.push_str(&format!("\n    held for you: {}", describe_slot(slot)));
    }
    if let Some(slots) = &entry.attached_slots {
        for (i, slot) in slots.iter().enumerate() {
            out.push_str(&format!("\n    [{}] {}", i + 1, describe_slot(slot)));
        }
    }
    out
}

/// The most recent emergency slot held in the conversation, if any.
pub fn held_emergency_slot(entries: &[ConversationEntry]) -> Option<String> {
    entries
        .iter()
        .rev()
        .find_map(|e| e.attached_emergency_slot.as_ref())
        .map(describe_slot)
}

/// Tracks which entries have already been printed.
#[derive(Debug, Default)]
pub struct Transcript {
    printed: usize,
}

impl Transcript {
    /// Entries appended since the last call. A log that shrank (new booking)
    /// is printed again from the start.
    pub fn fresh<'a>(&mut self, entries: &'a [ConversationEntry]) -> &'a [ConversationEntry] {
        if entries.len() < self.printed {
            self.printed = 0;
        }
        let start = self.printed;
        self.printed = entries.len();
        &entries[start..]
    }

    /// Forget progress so the next call returns everything.
    pub fn reset(&mut self) {
        self.printed = 0;
    }
}
