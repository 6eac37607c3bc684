// libs/appointment-cell/src/services/authorization.rs
use tracing::debug;

use crate::models::{Appointment, AppointmentError, CallerContext, CreateAppointmentRequest, Role};

/// Role-based permission checks gating every lifecycle operation.
///
/// All predicates are pure: they inspect the caller context and the
/// appointment and never touch the store. An unresolved client or
/// professional record id in the context simply never matches ownership.
pub struct AppointmentAuthorization;

impl AppointmentAuthorization {
    pub fn is_admin(caller: &CallerContext) -> bool {
        caller.role == Role::Admin
    }

    pub fn is_owning_client(appointment: &Appointment, caller: &CallerContext) -> bool {
        caller.role == Role::Client && caller.client_id == Some(appointment.client_id)
    }

    pub fn is_assigned_professional(appointment: &Appointment, caller: &CallerContext) -> bool {
        caller.role == Role::Professional
            && caller.professional_id == Some(appointment.professional_id)
    }

    fn ensure(allowed: bool, operation: &str, caller: &CallerContext) -> Result<(), AppointmentError> {
        if allowed {
            Ok(())
        } else {
            debug!("Denied {} for user {} with role {}", operation, caller.user_id, caller.role);
            Err(AppointmentError::Forbidden)
        }
    }

    /// Only the owning client may book for themselves; admins may book for anyone.
    pub fn authorize_create(
        request: &CreateAppointmentRequest,
        caller: &CallerContext,
    ) -> Result<(), AppointmentError> {
        let is_own_booking =
            caller.role == Role::Client && caller.client_id == Some(request.client_id);

        Self::ensure(is_own_booking || Self::is_admin(caller), "create", caller)
    }

    /// Confirmation is reserved to the assigned professional or an admin.
    pub fn authorize_confirm(
        appointment: &Appointment,
        caller: &CallerContext,
    ) -> Result<(), AppointmentError> {
        Self::ensure(
            Self::is_assigned_professional(appointment, caller) || Self::is_admin(caller),
            "confirm",
            caller,
        )
    }

    /// Either party to the appointment, or an admin, may cancel.
    pub fn authorize_cancel(
        appointment: &Appointment,
        caller: &CallerContext,
    ) -> Result<(), AppointmentError> {
        Self::ensure(
            Self::is_owning_client(appointment, caller)
                || Self::is_assigned_professional(appointment, caller)
                || Self::is_admin(caller),
            "cancel",
            caller,
        )
    }

    /// Completion is reserved to the assigned professional or an admin.
    pub fn authorize_complete(
        appointment: &Appointment,
        caller: &CallerContext,
    ) -> Result<(), AppointmentError> {
        Self::ensure(
            Self::is_assigned_professional(appointment, caller) || Self::is_admin(caller),
            "complete",
            caller,
        )
    }

    /// Either party to the appointment, or an admin, may reschedule.
    pub fn authorize_reschedule(
        appointment: &Appointment,
        caller: &CallerContext,
    ) -> Result<(), AppointmentError> {
        Self::ensure(
            Self::is_owning_client(appointment, caller)
                || Self::is_assigned_professional(appointment, caller)
                || Self::is_admin(caller),
            "reschedule",
            caller,
        )
    }

    /// Viewing follows the same ownership rule as cancellation.
    pub fn authorize_view(
        appointment: &Appointment,
        caller: &CallerContext,
    ) -> Result<(), AppointmentError> {
        Self::ensure(
            Self::is_owning_client(appointment, caller)
                || Self::is_assigned_professional(appointment, caller)
                || Self::is_admin(caller),
            "view",
            caller,
        )
    }
}
