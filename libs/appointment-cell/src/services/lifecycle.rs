// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::models::{AppointmentStatus, AppointmentError};

/// Pure appointment state machine: pending -> confirmed -> completed, with
/// cancellation possible from either live state. Terminal states accept
/// nothing.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        let valid_transitions = self.get_valid_transitions(current_status);

        if !valid_transitions.contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidTransition(*current_status));
        }

        info!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Rescheduling keeps the status and moves the date; it is only
    /// permitted while the appointment is still live.
    pub fn can_reschedule(&self, current_status: &AppointmentStatus) -> bool {
        matches!(current_status, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    /// An appointment must be scheduled strictly in the future, checked
    /// against wall clock at the moment of the operation.
    pub fn validate_appointment_time(
        &self,
        scheduled_time: DateTime<Utc>,
        current_time: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        if scheduled_time <= current_time {
            return Err(AppointmentError::Validation(
                "Appointment must be scheduled for a future time".to_string()
            ));
        }

        Ok(())
    }

    /// Combined reschedule guard: live status plus a strictly-future new time.
    pub fn validate_reschedule(
        &self,
        current_status: &AppointmentStatus,
        new_time: DateTime<Utc>,
        current_time: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        if !self.can_reschedule(current_status) {
            warn!("Reschedule attempted in status {}", current_status);
            return Err(AppointmentError::InvalidTransition(*current_status));
        }

        self.validate_appointment_time(new_time, current_time)
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
