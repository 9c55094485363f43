use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Role attached to an authenticated identity.
///
/// Only `Patient` identities may open a booking session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientRole {
    Patient,
    Staff,
    Admin,
}

impl fmt::Display for PatientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientRole::Patient => write!(f, "patient"),
            PatientRole::Staff => write!(f, "staff"),
            PatientRole::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for PatientRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(PatientRole::Patient),
            "staff" => Ok(PatientRole::Staff),
            "admin" => Ok(PatientRole::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

// =============================================================================
// Identity
// =============================================================================

/// The authenticated person a booking session acts for.
///
/// Supplied once by the identity provider and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientIdentity {
    pub id: String,
    pub display_name: Option<String>,
    pub role: PatientRole,
}

impl PatientIdentity {
    pub fn patient(id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            display_name,
            role: PatientRole::Patient,
        }
    }

    pub fn is_patient(&self) -> bool {
        self.role == PatientRole::Patient
    }

    /// Display name with surrounding whitespace removed, if non-empty.
    pub fn greeting_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Unique identifier for a booking session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Temporal
// =============================================================================

/// Unix timestamp in seconds since epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }
}
