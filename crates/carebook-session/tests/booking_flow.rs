//! End-to-end booking conversations against scripted collaborators.
//!
//! Each test builds its own session and collaborators, drives it through the
//! public API, and checks the resulting step, state, and conversation log.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use tokio::sync::Notify;

use carebook_core::config::CarebookConfig;
use carebook_core::types::PatientIdentity;
use carebook_session::messages::CLARIFY_HINT;
use carebook_session::{
    BookingSession, Collaborators, ScriptedBooking, ScriptedSlotSearch, ScriptedTriage,
    ServiceError, SessionError, SessionStep, SlotCandidate, SlotKind, SlotSearchResult,
    Speaker, TriageOutcome, TriageResult,
};

// =============================================================================
// Helpers
// =============================================================================

struct Harness {
    session: Arc<BookingSession>,
    triage: Arc<ScriptedTriage>,
    search: Arc<ScriptedSlotSearch>,
    booking: Arc<ScriptedBooking>,
}

fn harness_with(
    triage: ScriptedTriage,
    search: ScriptedSlotSearch,
    booking: ScriptedBooking,
    config: CarebookConfig,
) -> Harness {
    let triage = Arc::new(triage);
    let search = Arc::new(search);
    let booking = Arc::new(booking);
    let services = Collaborators::new(triage.clone(), search.clone(), booking.clone());
    let patient = PatientIdentity::patient("patient-42", Some("Jordan".to_string()));
    let session = Arc::new(BookingSession::start(patient, services, &config).unwrap());
    Harness {
        session,
        triage,
        search,
        booking,
    }
}

fn harness(triage: ScriptedTriage, search: ScriptedSlotSearch) -> Harness {
    harness_with(triage, search, ScriptedBooking::new(), CarebookConfig::default())
}

fn slot(kind: SlotKind, doctor_id: u64, hour: u32) -> SlotCandidate {
    SlotCandidate {
        kind,
        date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
        start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(hour, 45, 0).unwrap(),
        duration_minutes: 45,
        doctor_id,
        doctor_name: format!("Dr. {}", doctor_id),
        room_id: 3,
        room_name: "Surgery 3".to_string(),
        clinic_id: 1,
        staff_id: Some(11),
        staff_name: Some("Alex".to_string()),
        procedure_label: "Filling".to_string(),
        rank_score: 0.5,
    }
}

fn triage_result(procedure_id: u64) -> TriageResult {
    TriageResult {
        procedure_id: Some(procedure_id),
        procedure_name: "Composite filling".to_string(),
        specialist_type: "general".to_string(),
        treatment_minutes: 30,
        consult_minutes: 15,
        requires_sedation: false,
        room_capability_required: false,
    }
}

fn clarify(message: &str) -> TriageOutcome {
    TriageOutcome::Clarify {
        message: message.to_string(),
    }
}

fn route(procedure_id: u64) -> TriageOutcome {
    TriageOutcome::Routed {
        message: String::new(),
        triage: Some(triage_result(procedure_id)),
    }
}

fn emergency_with_slot(emergency_slot: SlotCandidate) -> TriageOutcome {
    TriageOutcome::Emergency {
        message: "This sounds urgent. I've held the next emergency slot for you.".to_string(),
        triage: Some(triage_result(99)),
        emergency_slot: Some(emergency_slot),
    }
}

fn offer(combo: Vec<SlotCandidate>, single: Vec<SlotCandidate>) -> SlotSearchResult {
    SlotSearchResult {
        combo_slots: combo,
        single_slots: single,
        note: None,
    }
}

/// Drive a fresh session to SLOTS with `[s1, s2, s3]` offered.
async fn at_slots() -> (Harness, Vec<SlotCandidate>) {
    let s1 = slot(SlotKind::Combo, 1, 9);
    let s2 = slot(SlotKind::Single, 2, 10);
    let s3 = slot(SlotKind::Single, 3, 11);
    let h = harness(
        ScriptedTriage::with_outcomes([route(12)]),
        ScriptedSlotSearch::with_results([offer(vec![s1.clone()], vec![s2.clone(), s3.clone()])]),
    );
    h.session.submit_text("Filling fell out").await.unwrap();
    (h, vec![s1, s2, s3])
}

async fn wait_until_busy(session: &BookingSession) {
    for _ in 0..1000 {
        if session.is_busy() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("session never became busy");
}

// =============================================================================
// Clarification streak
// =============================================================================

#[tokio::test]
async fn test_clarify_streak_increments_then_resets() {
    let h = harness(
        ScriptedTriage::with_outcomes([
            clarify("Which tooth?"),
            clarify("How long has it hurt?"),
            TriageOutcome::Greet {
                message: "Hello!".to_string(),
            },
            clarify("Is there swelling?"),
        ]),
        ScriptedSlotSearch::new(),
    );

    h.session.submit_text("it hurts").await.unwrap();
    assert_eq!(h.session.clarification_streak(), 1);
    h.session.submit_text("the back one").await.unwrap();
    assert_eq!(h.session.clarification_streak(), 2);
    h.session.submit_text("hi again").await.unwrap();
    assert_eq!(h.session.clarification_streak(), 0);
    h.session.submit_text("still sore").await.unwrap();
    assert_eq!(h.session.clarification_streak(), 1);
    assert_eq!(h.session.step(), SessionStep::Triage);
}

#[tokio::test]
async fn test_scenario_b_third_clarification_adds_hint() {
    let h = harness(
        ScriptedTriage::with_outcomes([
            clarify("Can you tell me more?"),
            clarify("Where exactly?"),
            clarify("What does it feel like?"),
        ]),
        ScriptedSlotSearch::new(),
    );

    h.session.submit_text("not great").await.unwrap();
    h.session.submit_text("kind of bad").await.unwrap();
    assert!(!h
        .session
        .entries()
        .iter()
        .any(|e| e.text == CLARIFY_HINT));

    h.session.submit_text("it's weird").await.unwrap();
    assert_eq!(h.session.clarification_streak(), 3);

    let entries = h.session.entries();
    let n = entries.len();
    assert_eq!(entries[n - 2].text, "What does it feel like?");
    assert_eq!(entries[n - 1].text, CLARIFY_HINT);
    assert_eq!(entries[n - 1].speaker, Speaker::Assistant);
}

#[tokio::test]
async fn test_no_match_resets_streak_without_hint() {
    let h = harness(
        ScriptedTriage::with_outcomes([
            clarify("Which tooth?"),
            clarify("Since when?"),
            TriageOutcome::Routed {
                message: String::new(),
                triage: None,
            },
        ]),
        ScriptedSlotSearch::new(),
    );

    h.session.submit_text("it hurts").await.unwrap();
    h.session.submit_text("a while").await.unwrap();
    assert_eq!(h.session.clarification_streak(), 2);

    let step = h.session.submit_text("hard to say").await.unwrap();
    assert_eq!(step, SessionStep::Triage);
    assert_eq!(h.session.clarification_streak(), 0);
    assert!(!h.session.entries().iter().any(|e| e.text == CLARIFY_HINT));
    assert!(h.session.last_entry().unwrap().text.contains("couldn't match"));
    assert!(h.search.calls().is_empty());
}

#[tokio::test]
async fn test_route_resets_streak_and_offers_slots() {
    let s1 = slot(SlotKind::Single, 2, 10);
    let h = harness(
        ScriptedTriage::with_outcomes([clarify("Which tooth?"), clarify("Since when?"), route(12)]),
        ScriptedSlotSearch::with_results([offer(vec![], vec![s1.clone()])]),
    );

    h.session.submit_text("it hurts").await.unwrap();
    h.session.submit_text("a few days").await.unwrap();
    assert_eq!(h.session.clarification_streak(), 2);

    let step = h.session.submit_text("upper molar, throbbing").await.unwrap();
    assert_eq!(step, SessionStep::Slots);
    assert_eq!(h.session.clarification_streak(), 0);
    assert_eq!(h.session.offered_slots(), vec![s1]);
}

#[tokio::test]
async fn test_hint_threshold_is_configurable() {
    let mut config = CarebookConfig::default();
    config.session.clarify_hint_threshold = 1;
    let h = harness_with(
        ScriptedTriage::with_outcomes([clarify("Which side?")]),
        ScriptedSlotSearch::new(),
        ScriptedBooking::new(),
        config,
    );
    h.session.submit_text("ouch").await.unwrap();
    assert_eq!(h.session.last_entry().unwrap().text, CLARIFY_HINT);
}

// =============================================================================
// Emergency preemption
// =============================================================================

#[tokio::test]
async fn test_scenario_a_emergency_goes_straight_to_confirm() {
    let held = slot(SlotKind::Single, 5, 8);
    let h = harness(
        ScriptedTriage::with_outcomes([
            clarify("Which tooth?"),
            clarify("Since when?"),
            emergency_with_slot(held.clone()),
        ]),
        ScriptedSlotSearch::new(),
    );

    h.session.submit_text("pain").await.unwrap();
    h.session.submit_text("lower left").await.unwrap();
    let step = h
        .session
        .submit_text("My tooth hurts, 9/10 pain, started yesterday")
        .await
        .unwrap();

    assert_eq!(step, SessionStep::Confirm);
    assert_eq!(h.session.selected_slot(), Some(held.clone()));
    assert_eq!(h.session.clarification_streak(), 0);
    assert_eq!(h.session.active_triage().unwrap().procedure_id, Some(99));
    assert!(h.search.calls().is_empty(), "emergency must bypass slot search");

    let last = h.session.last_entry().unwrap();
    assert!(last.is_emergency);
    assert_eq!(last.attached_emergency_slot, Some(held));
    assert!(last.attached_triage.is_some());
}

#[tokio::test]
async fn test_emergency_without_slot_stays_in_triage() {
    let h = harness(
        ScriptedTriage::with_outcomes([TriageOutcome::Emergency {
            message: "Please call the clinic now.".to_string(),
            triage: None,
            emergency_slot: None,
        }]),
        ScriptedSlotSearch::new(),
    );
    let step = h.session.submit_text("face is swelling fast").await.unwrap();
    assert_eq!(step, SessionStep::Triage);
    assert!(h.session.selected_slot().is_none());
    assert!(h.session.last_entry().unwrap().is_emergency);
}

#[tokio::test]
async fn test_emergency_adjust_offers_the_held_slot_again() {
    let held = slot(SlotKind::Single, 5, 8);
    let h = harness(
        ScriptedTriage::with_outcomes([emergency_with_slot(held.clone())]),
        ScriptedSlotSearch::new(),
    );
    h.session.submit_text("severe pain").await.unwrap();

    assert_eq!(h.session.adjust_slot().unwrap(), SessionStep::Slots);
    assert_eq!(h.session.offered_slots(), vec![held.clone()]);
    assert_eq!(h.session.select_slot(&held).unwrap(), SessionStep::Confirm);
    assert_eq!(h.session.selected_slot(), Some(held));
}

// =============================================================================
// Routing and slot search
// =============================================================================

#[tokio::test]
async fn test_scenario_c_offer_is_combo_then_single() {
    let (h, expected) = at_slots().await;

    assert_eq!(h.session.step(), SessionStep::Slots);
    assert_eq!(h.session.offered_slots(), expected);
    let last = h.session.last_entry().unwrap();
    assert_eq!(last.attached_slots, Some(expected));

    let searches = h.search.calls();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].procedure_id, 12);
    assert!(!searches[0].requires_sedation);
}

#[tokio::test]
async fn test_route_appends_analysis_summary_with_triage() {
    let (h, _) = at_slots().await;
    let entries = h.session.entries();
    // greeting, user, analysis, offer
    assert_eq!(entries.len(), 4);
    assert!(entries[2].text.contains("Analysis complete"));
    assert_eq!(entries[2].attached_triage, Some(triage_result(12)));
}

#[tokio::test]
async fn test_empty_search_stays_in_triage_without_slot_list() {
    let h = harness(
        ScriptedTriage::with_outcomes([route(12)]),
        ScriptedSlotSearch::with_results([offer(vec![], vec![])]),
    );
    let step = h.session.submit_text("chipped tooth").await.unwrap();

    assert_eq!(step, SessionStep::Triage);
    let last = h.session.last_entry().unwrap();
    assert!(last.attached_slots.is_none());
    assert!(last.text.contains("no available times"));
    assert!(h.session.offered_slots().is_empty());
}

#[tokio::test]
async fn test_search_failure_stays_in_triage() {
    let search = ScriptedSlotSearch::new();
    search.push_failure(ServiceError::Unavailable("search offline".to_string()));
    let h = harness(ScriptedTriage::with_outcomes([route(12)]), search);

    let step = h.session.submit_text("cracked molar").await.unwrap();
    assert_eq!(step, SessionStep::Triage);
    assert!(!h.session.is_busy());
    assert!(h
        .session
        .last_entry()
        .unwrap()
        .text
        .contains("couldn't look up available times"));
}

#[tokio::test]
async fn test_retry_search_reuses_classification() {
    let s1 = slot(SlotKind::Single, 4, 13);
    let search = ScriptedSlotSearch::new();
    search.push(offer(vec![], vec![]));
    search.push(offer(vec![], vec![s1.clone()]));
    let h = harness(ScriptedTriage::with_outcomes([route(12)]), search);

    h.session.submit_text("lost a crown").await.unwrap();
    assert_eq!(h.session.step(), SessionStep::Triage);

    let step = h.session.retry_search().await.unwrap();
    assert_eq!(step, SessionStep::Slots);
    assert_eq!(h.session.offered_slots(), vec![s1]);
    assert_eq!(h.triage.calls().len(), 1, "retry must not re-run triage");
    assert_eq!(h.search.calls().len(), 2);

    assert!(matches!(
        h.session.retry_search().await,
        Err(SessionError::NotAllowed { .. })
    ));
}

#[tokio::test]
async fn test_text_rejected_while_choosing_slots() {
    let (h, _) = at_slots().await;
    let result = h.session.submit_text("actually, never mind").await;
    assert!(matches!(
        result,
        Err(SessionError::NotAllowed {
            step: SessionStep::Slots,
            ..
        })
    ));
    assert_eq!(h.triage.calls().len(), 1);
}

// =============================================================================
// Selection and adjustment
// =============================================================================

#[tokio::test]
async fn test_select_slot_prompts_confirmation() {
    let (h, slots) = at_slots().await;
    let step = h.session.select_slot(&slots[1]).unwrap();

    assert_eq!(step, SessionStep::Confirm);
    assert_eq!(h.session.selected_slot(), Some(slots[1].clone()));
    assert!(h.session.last_entry().unwrap().text.contains("Dr. 2"));
}

#[tokio::test]
async fn test_select_unknown_slot_rejected() {
    let (h, _) = at_slots().await;
    let stranger = slot(SlotKind::Single, 77, 16);
    assert!(matches!(
        h.session.select_slot(&stranger),
        Err(SessionError::UnknownSlot)
    ));
    assert_eq!(h.session.step(), SessionStep::Slots);
    assert!(!h.session.is_busy());
}

#[tokio::test]
async fn test_select_by_index() {
    let (h, slots) = at_slots().await;
    assert!(matches!(
        h.session.select_slot_at(3),
        Err(SessionError::SlotIndexOutOfRange(3))
    ));
    h.session.select_slot_at(2).unwrap();
    assert_eq!(h.session.selected_slot(), Some(slots[2].clone()));
}

#[tokio::test]
async fn test_select_slot_with_nan_score() {
    let mut odd = slot(SlotKind::Single, 6, 15);
    odd.rank_score = f64::NAN;
    let h = harness(
        ScriptedTriage::with_outcomes([route(12)]),
        ScriptedSlotSearch::with_results([offer(vec![], vec![odd.clone()])]),
    );
    h.session.submit_text("loose crown").await.unwrap();

    assert_eq!(h.session.select_slot(&odd).unwrap(), SessionStep::Confirm);
    assert_eq!(h.session.selected_slot(), Some(odd));
}

#[tokio::test]
async fn test_adjust_then_reselect_is_idempotent() {
    let (h, slots) = at_slots().await;
    h.session.select_slot(&slots[0]).unwrap();
    let before = h.session.snapshot();

    assert_eq!(h.session.adjust_slot().unwrap(), SessionStep::Slots);
    assert!(h.session.selected_slot().is_none());
    assert_eq!(h.session.offered_slots(), slots, "adjust must not re-fetch");
    assert_eq!(h.search.calls().len(), 1);

    h.session.select_slot(&slots[0]).unwrap();
    let after = h.session.snapshot();
    assert_eq!(after.step, before.step);
    assert_eq!(after.selected_slot, before.selected_slot);
    assert_eq!(after.active_triage, before.active_triage);
    assert_eq!(after.offered_slots, before.offered_slots);
}

// =============================================================================
// Confirmation
// =============================================================================

#[tokio::test]
async fn test_scenario_d_booking_failure_keeps_selection() {
    let (h, slots) = at_slots().await;
    h.booking
        .push_failure(ServiceError::Rejected("slot just taken".to_string()));
    h.session.select_slot(&slots[0]).unwrap();
    let entries_before = h.session.entry_count();

    let step = h.session.confirm_booking().await.unwrap();
    assert_eq!(step, SessionStep::Confirm);
    assert_eq!(h.session.selected_slot(), Some(slots[0].clone()));
    assert_eq!(h.session.entry_count(), entries_before + 1);
    let last = h.session.last_entry().unwrap();
    assert!(!last.booked);
    assert!(last.text.contains("couldn't complete the booking"));

    // The same confirmation can simply be retried.
    let step = h.session.confirm_booking().await.unwrap();
    assert_eq!(step, SessionStep::Done);
    assert_eq!(h.booking.calls().len(), 2);
}

#[tokio::test]
async fn test_scenario_e_booking_success_finishes() {
    let (h, slots) = at_slots().await;
    h.session.select_slot(&slots[2]).unwrap();

    let step = h.session.confirm_booking().await.unwrap();
    assert_eq!(step, SessionStep::Done);
    let last = h.session.last_entry().unwrap();
    assert!(last.booked);
    assert!(last.text.contains("APT-0001"));

    let calls = h.booking.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].patient_id, "patient-42");
    assert_eq!(calls[0].procedure_id, 12);
    assert_eq!(calls[0].slot, slots[2]);
}

#[tokio::test]
async fn test_slow_booking_is_not_cut_short() {
    let s1 = slot(SlotKind::Single, 1, 9);
    let mut config = CarebookConfig::default();
    config.session.service_timeout_secs = 1;
    let h = harness_with(
        ScriptedTriage::with_outcomes([route(12)]),
        ScriptedSlotSearch::with_results([offer(vec![], vec![s1.clone()])]),
        ScriptedBooking::new().delayed_by(Duration::from_millis(1500)),
        config,
    );
    h.session.submit_text("need a filling").await.unwrap();
    h.session.select_slot(&s1).unwrap();

    let step = h.session.confirm_booking().await.unwrap();
    assert_eq!(step, SessionStep::Done);
    assert!(h.session.last_entry().unwrap().booked);
    assert_eq!(h.booking.calls().len(), 1);

    assert!(matches!(
        h.session.confirm_booking().await,
        Err(SessionError::NotAllowed { .. })
    ));
    assert_eq!(h.booking.calls().len(), 1);
}

#[tokio::test]
async fn test_emergency_booking_uses_emergency_triage() {
    let held = slot(SlotKind::Single, 5, 8);
    let h = harness(
        ScriptedTriage::with_outcomes([emergency_with_slot(held.clone())]),
        ScriptedSlotSearch::new(),
    );
    h.session.submit_text("knocked out a tooth").await.unwrap();
    assert_eq!(h.session.confirm_booking().await.unwrap(), SessionStep::Done);

    let calls = h.booking.calls();
    assert_eq!(calls[0].procedure_id, 99);
    assert_eq!(calls[0].slot, held);
}

#[tokio::test]
async fn test_emergency_without_procedure_cannot_book() {
    let held = slot(SlotKind::Single, 5, 8);
    let h = harness(
        ScriptedTriage::with_outcomes([TriageOutcome::Emergency {
            message: "Come in now.".to_string(),
            triage: None,
            emergency_slot: Some(held),
        }]),
        ScriptedSlotSearch::new(),
    );
    h.session.submit_text("bleeding won't stop").await.unwrap();
    assert_eq!(h.session.step(), SessionStep::Confirm);

    let step = h.session.confirm_booking().await.unwrap();
    assert_eq!(step, SessionStep::Confirm);
    assert!(h.booking.calls().is_empty());
    assert!(h
        .session
        .last_entry()
        .unwrap()
        .text
        .contains("don't have a treatment on file"));
}

// =============================================================================
// Busy gating
// =============================================================================

#[tokio::test]
async fn test_duplicate_confirm_while_busy_books_once() {
    let gate = Arc::new(Notify::new());
    let s1 = slot(SlotKind::Single, 1, 9);
    let h = harness_with(
        ScriptedTriage::with_outcomes([route(12)]),
        ScriptedSlotSearch::with_results([offer(vec![], vec![s1.clone()])]),
        ScriptedBooking::new().held_by(Arc::clone(&gate)),
        CarebookConfig::default(),
    );
    h.session.submit_text("need a cleaning").await.unwrap();
    h.session.select_slot(&s1).unwrap();

    let first = {
        let session = Arc::clone(&h.session);
        tokio::spawn(async move { session.confirm_booking().await })
    };
    wait_until_busy(&h.session).await;

    assert!(matches!(
        h.session.confirm_booking().await,
        Err(SessionError::Busy)
    ));
    assert!(matches!(h.session.adjust_slot(), Err(SessionError::Busy)));

    gate.notify_one();
    assert_eq!(first.await.unwrap().unwrap(), SessionStep::Done);
    assert_eq!(h.booking.calls().len(), 1);
    assert!(!h.session.is_busy());
}

#[tokio::test]
async fn test_text_rejected_while_triage_outstanding() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        ScriptedTriage::with_outcomes([clarify("Which tooth?")]).held_by(Arc::clone(&gate)),
        ScriptedSlotSearch::new(),
    );

    let first = {
        let session = Arc::clone(&h.session);
        tokio::spawn(async move { session.submit_text("it hurts").await })
    };
    wait_until_busy(&h.session).await;

    assert!(matches!(
        h.session.submit_text("hello??").await,
        Err(SessionError::Busy)
    ));

    gate.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(h.triage.calls().len(), 1);
    assert_eq!(h.session.clarification_streak(), 1);
}

#[tokio::test]
async fn test_dropped_call_releases_busy() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        ScriptedTriage::with_outcomes([clarify("Which tooth?")]).held_by(gate),
        ScriptedSlotSearch::new(),
    );

    let pending = {
        let session = Arc::clone(&h.session);
        tokio::spawn(async move { session.submit_text("it hurts").await })
    };
    wait_until_busy(&h.session).await;
    pending.abort();
    let _ = pending.await;

    assert!(!h.session.is_busy());
    assert_eq!(h.session.step(), SessionStep::Triage);
    // Only the greeting: the abandoned turn is not left unanswered in the log.
    assert_eq!(h.session.entry_count(), 1);
}

#[tokio::test]
async fn test_hung_triage_times_out_with_reply() {
    let mut config = CarebookConfig::default();
    config.session.service_timeout_secs = 1;
    let h = harness_with(
        ScriptedTriage::with_outcomes([clarify("Which tooth?")]).held_by(Arc::new(Notify::new())),
        ScriptedSlotSearch::new(),
        ScriptedBooking::new(),
        config,
    );

    let step = h.session.submit_text("it hurts").await.unwrap();
    assert_eq!(step, SessionStep::Triage);
    assert!(!h.session.is_busy());

    let entries = h.session.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].speaker, Speaker::User);
    assert!(entries[2].text.contains("went wrong"));
}

#[tokio::test]
async fn test_hung_search_times_out() {
    let mut config = CarebookConfig::default();
    config.session.service_timeout_secs = 1;
    let h = harness_with(
        ScriptedTriage::with_outcomes([route(12)]),
        ScriptedSlotSearch::new().delayed_by(Duration::from_secs(5)),
        ScriptedBooking::new(),
        config,
    );

    let step = h.session.submit_text("broken filling").await.unwrap();
    assert_eq!(step, SessionStep::Triage);
    assert!(!h.session.is_busy());
    assert!(h
        .session
        .last_entry()
        .unwrap()
        .text
        .contains("couldn't look up available times"));
}

// =============================================================================
// New booking
// =============================================================================

#[tokio::test]
async fn test_new_booking_resets_everything() {
    let (h, slots) = at_slots().await;
    h.session.select_slot(&slots[0]).unwrap();
    h.session.confirm_booking().await.unwrap();

    assert!(matches!(
        h.session.confirm_booking().await,
        Err(SessionError::NotAllowed {
            step: SessionStep::Done,
            ..
        })
    ));

    let step = h.session.new_booking().unwrap();
    assert_eq!(step, SessionStep::Triage);
    assert!(h.session.active_triage().is_none());
    assert!(h.session.selected_slot().is_none());
    assert!(h.session.offered_slots().is_empty());
    assert_eq!(h.session.clarification_streak(), 0);

    let entries = h.session.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].text.contains("Jordan"));
}
