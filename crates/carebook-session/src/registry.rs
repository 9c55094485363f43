//! Registry of live booking sessions.
//!
//! Opens sessions for authenticated patients, hands out shared handles, and
//! tears sessions down when a patient's identity goes away.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use carebook_core::config::CarebookConfig;
use carebook_core::types::{PatientIdentity, SessionId};
use tracing::info;

use crate::controller::BookingSession;
use crate::error::SessionError;
use crate::service::Collaborators;
use crate::types::SessionSummary;

/// Owns every live [`BookingSession`], keyed by id.
pub struct SessionRegistry {
    services: Collaborators,
    config: CarebookConfig,
    sessions: Mutex<HashMap<SessionId, Arc<BookingSession>>>,
}

impl SessionRegistry {
    pub fn new(services: Collaborators, config: CarebookConfig) -> Self {
        Self {
            services,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Open a new session once the identity provider has supplied a patient.
    pub fn open(&self, patient: PatientIdentity) -> Result<Arc<BookingSession>, SessionError> {
        let session = Arc::new(BookingSession::start(
            patient,
            self.services.clone(),
            &self.config,
        )?);
        self.lock()?.insert(session.id(), Arc::clone(&session));
        Ok(session)
    }

    /// Get a session by id.
    pub fn get(&self, session_id: SessionId) -> Result<Arc<BookingSession>, SessionError> {
        self.lock()?
            .get(&session_id)
            .cloned()
            .ok_or(SessionError::SessionNotFound(session_id))
    }

    /// Destroy a session.
    pub fn close(&self, session_id: SessionId) -> Result<(), SessionError> {
        if self.lock()?.remove(&session_id).is_some() {
            info!(session_id = %session_id, "Booking session closed");
            Ok(())
        } else {
            Err(SessionError::SessionNotFound(session_id))
        }
    }

    /// Destroy every session belonging to `patient_id` (logout or identity
    /// loss). Returns how many were removed.
    pub fn close_for_patient(&self, patient_id: &str) -> Result<usize, SessionError> {
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, session| session.patient().id != patient_id);
        let removed = before - sessions.len();
        if removed > 0 {
            info!(patient_id, removed, "Booking sessions closed for patient");
        }
        Ok(removed)
    }

    /// List live sessions, oldest first.
    pub fn list(&self) -> Vec<SessionSummary> {
        let sessions = match self.lock() {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        let mut summaries: Vec<SessionSummary> = sessions
            .values()
            .map(|s| SessionSummary {
                session_id: s.id(),
                patient_id: s.patient().id.clone(),
                step: s.step(),
                entry_count: s.entry_count(),
                started_at: s.started_at(),
            })
            .collect();
        summaries.sort_by_key(|s| s.started_at);
        summaries
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, Arc<BookingSession>>>, SessionError> {
        self.sessions
            .lock()
            .map_err(|e| SessionError::LockPoisoned(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carebook_core::types::PatientRole;

    use crate::scripted::Script;
    use crate::types::SessionStep;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(
            Script::default().into_collaborators(),
            CarebookConfig::default(),
        )
    }

    fn patient(id: &str) -> PatientIdentity {
        PatientIdentity::patient(id, None)
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = registry();
        assert!(registry.is_empty());
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_open_and_get() {
        let registry = registry();
        let session = registry.open(patient("p-1")).unwrap();
        assert_eq!(session.step(), SessionStep::Triage);

        let fetched = registry.get(session.id()).unwrap();
        assert!(Arc::ptr_eq(&session, &fetched));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_open_rejects_non_patient() {
        let registry = registry();
        let identity = PatientIdentity {
            id: "s-1".to_string(),
            display_name: None,
            role: PatientRole::Staff,
        };
        assert!(matches!(
            registry.open(identity),
            Err(SessionError::NotAPatient(PatientRole::Staff))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_unknown_session() {
        let registry = registry();
        let id = SessionId::new();
        assert!(matches!(
            registry.get(id),
            Err(SessionError::SessionNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn test_close_session() {
        let registry = registry();
        let session = registry.open(patient("p-1")).unwrap();
        registry.close(session.id()).unwrap();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.close(session.id()),
            Err(SessionError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_close_for_patient_only_removes_theirs() {
        let registry = registry();
        registry.open(patient("p-1")).unwrap();
        registry.open(patient("p-1")).unwrap();
        let other = registry.open(patient("p-2")).unwrap();

        assert_eq!(registry.close_for_patient("p-1").unwrap(), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(other.id()).is_ok());
        assert_eq!(registry.close_for_patient("p-1").unwrap(), 0);
    }

    #[test]
    fn test_list_summaries() {
        let registry = registry();
        let session = registry.open(patient("p-7")).unwrap();
        let list = registry.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].session_id, session.id());
        assert_eq!(list[0].patient_id, "p-7");
        assert_eq!(list[0].step, SessionStep::Triage);
        assert_eq!(list[0].entry_count, 1);
    }
}
