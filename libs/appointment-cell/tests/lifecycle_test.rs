use assert_matches::assert_matches;
use chrono::{Duration, Utc};

use appointment_cell::models::{AppointmentError, AppointmentStatus};
use appointment_cell::services::lifecycle::AppointmentLifecycleService;

const ALL_STATUSES: [AppointmentStatus; 4] = [
    AppointmentStatus::Pending,
    AppointmentStatus::Confirmed,
    AppointmentStatus::Cancelled,
    AppointmentStatus::Completed,
];

#[test]
fn test_valid_transitions_from_pending() {
    let lifecycle = AppointmentLifecycleService::new();
    let transitions = lifecycle.get_valid_transitions(&AppointmentStatus::Pending);

    assert_eq!(transitions.len(), 2);
    assert!(transitions.contains(&AppointmentStatus::Confirmed));
    assert!(transitions.contains(&AppointmentStatus::Cancelled));
}

#[test]
fn test_valid_transitions_from_confirmed() {
    let lifecycle = AppointmentLifecycleService::new();
    let transitions = lifecycle.get_valid_transitions(&AppointmentStatus::Confirmed);

    assert_eq!(transitions.len(), 2);
    assert!(transitions.contains(&AppointmentStatus::Completed));
    assert!(transitions.contains(&AppointmentStatus::Cancelled));
}

#[test]
fn test_terminal_states_allow_no_transitions() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle.get_valid_transitions(&AppointmentStatus::Cancelled).is_empty());
    assert!(lifecycle.get_valid_transitions(&AppointmentStatus::Completed).is_empty());

    for target in ALL_STATUSES {
        assert_matches!(
            lifecycle.validate_status_transition(&AppointmentStatus::Cancelled, &target),
            Err(AppointmentError::InvalidTransition(AppointmentStatus::Cancelled))
        );
        assert_matches!(
            lifecycle.validate_status_transition(&AppointmentStatus::Completed, &target),
            Err(AppointmentError::InvalidTransition(AppointmentStatus::Completed))
        );
    }
}

#[test]
fn test_confirm_only_from_pending() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle
        .validate_status_transition(&AppointmentStatus::Pending, &AppointmentStatus::Confirmed)
        .is_ok());

    for status in [AppointmentStatus::Confirmed, AppointmentStatus::Cancelled, AppointmentStatus::Completed] {
        assert_matches!(
            lifecycle.validate_status_transition(&status, &AppointmentStatus::Confirmed),
            Err(AppointmentError::InvalidTransition(s)) if s == status
        );
    }
}

#[test]
fn test_complete_only_from_confirmed() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle
        .validate_status_transition(&AppointmentStatus::Confirmed, &AppointmentStatus::Completed)
        .is_ok());

    assert_matches!(
        lifecycle.validate_status_transition(&AppointmentStatus::Pending, &AppointmentStatus::Completed),
        Err(AppointmentError::InvalidTransition(AppointmentStatus::Pending))
    );
}

#[test]
fn test_cancel_from_both_live_states() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle
        .validate_status_transition(&AppointmentStatus::Pending, &AppointmentStatus::Cancelled)
        .is_ok());
    assert!(lifecycle
        .validate_status_transition(&AppointmentStatus::Confirmed, &AppointmentStatus::Cancelled)
        .is_ok());
}

#[test]
fn test_second_cancel_is_rejected() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle
        .validate_status_transition(&AppointmentStatus::Pending, &AppointmentStatus::Cancelled)
        .is_ok());

    // A second cancel starts from `cancelled` and must fail, not silently succeed.
    assert_matches!(
        lifecycle.validate_status_transition(&AppointmentStatus::Cancelled, &AppointmentStatus::Cancelled),
        Err(AppointmentError::InvalidTransition(AppointmentStatus::Cancelled))
    );
}

#[test]
fn test_can_reschedule_exactly_for_live_states() {
    let lifecycle = AppointmentLifecycleService::new();

    for status in ALL_STATUSES {
        let expected = matches!(status, AppointmentStatus::Pending | AppointmentStatus::Confirmed);
        assert_eq!(lifecycle.can_reschedule(&status), expected, "status {}", status);
    }
}

#[test]
fn test_entity_terminal_and_reschedule_flags_agree() {
    use uuid::Uuid;
    use appointment_cell::models::Appointment;

    for status in ALL_STATUSES {
        let appt = Appointment {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            date_time: Utc::now() + Duration::days(1),
            status,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(appt.is_terminal(), status.is_terminal());
        // A terminal appointment can never be rescheduled, and vice versa.
        assert_eq!(appt.can_reschedule(), !appt.is_terminal());
    }
}

#[test]
fn test_appointment_time_must_be_in_future() {
    let lifecycle = AppointmentLifecycleService::new();
    let now = Utc::now();

    assert!(lifecycle.validate_appointment_time(now + Duration::hours(1), now).is_ok());

    assert_matches!(
        lifecycle.validate_appointment_time(now - Duration::hours(1), now),
        Err(AppointmentError::Validation(_))
    );

    // Exactly "now" is not strictly in the future.
    assert_matches!(
        lifecycle.validate_appointment_time(now, now),
        Err(AppointmentError::Validation(_))
    );
}

#[test]
fn test_reschedule_guard_combines_status_and_time() {
    let lifecycle = AppointmentLifecycleService::new();
    let now = Utc::now();
    let future = now + Duration::days(1);
    let past = now - Duration::days(1);

    assert!(lifecycle.validate_reschedule(&AppointmentStatus::Pending, future, now).is_ok());
    assert!(lifecycle.validate_reschedule(&AppointmentStatus::Confirmed, future, now).is_ok());

    assert_matches!(
        lifecycle.validate_reschedule(&AppointmentStatus::Cancelled, future, now),
        Err(AppointmentError::InvalidTransition(AppointmentStatus::Cancelled))
    );
    assert_matches!(
        lifecycle.validate_reschedule(&AppointmentStatus::Completed, future, now),
        Err(AppointmentError::InvalidTransition(AppointmentStatus::Completed))
    );

    // A past target time fails validation even from a live status.
    assert_matches!(
        lifecycle.validate_reschedule(&AppointmentStatus::Pending, past, now),
        Err(AppointmentError::Validation(_))
    );
}
