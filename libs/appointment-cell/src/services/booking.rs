// libs/appointment-cell/src/services/booking.rs
use chrono::Utc;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentStatus, AppointmentError, AppointmentSearchQuery,
    CallerContext, CreateAppointmentRequest,
};
use crate::services::authorization::AppointmentAuthorization;
use crate::services::lifecycle::AppointmentLifecycleService;

/// Orchestrates the appointment lifecycle against the hosted store.
///
/// Every operation validates authorization and state-machine preconditions
/// before a single write-back; the store row is the source of truth and no
/// retries are performed here.
pub struct AppointmentBookingService {
    supabase: SupabaseClient,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    /// Create a new appointment with status `pending`.
    ///
    /// The insert uses one fixed schema; a mismatch surfaces as a store
    /// error rather than triggering a degraded retry.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        caller: &CallerContext,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking appointment for client {} with professional {}",
              request.client_id, request.professional_id);

        AppointmentAuthorization::authorize_create(&request, caller)?;

        self.lifecycle_service
            .validate_appointment_time(request.date_time, Utc::now())?;

        self.verify_reference("clients", &request.client_id, AppointmentError::ClientNotFound, auth_token).await?;
        self.verify_reference("professionals", &request.professional_id, AppointmentError::ProfessionalNotFound, auth_token).await?;
        self.verify_reference("services", &request.service_id, AppointmentError::ServiceNotFound, auth_token).await?;

        let now = Utc::now();
        let appointment_data = json!({
            "client_id": request.client_id,
            "professional_id": request.professional_id,
            "service_id": request.service_id,
            "date": request.date_time.to_rfc3339(),
            "status": AppointmentStatus::Pending,
            "notes": request.notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let created: Vec<Appointment> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(Self::representation_headers()),
        ).await.map_err(|e| AppointmentError::Store(e.to_string()))?;

        let appointment = created.into_iter().next()
            .ok_or_else(|| AppointmentError::Store("Insert returned no rows".to_string()))?;

        info!("Appointment {} booked for client {}", appointment.id, appointment.client_id);
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Appointment> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::Store(e.to_string()))?;

        rows.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    /// pending -> confirmed, by the assigned professional or an admin.
    pub async fn confirm_appointment(
        &self,
        appointment_id: Uuid,
        caller: &CallerContext,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        AppointmentAuthorization::authorize_confirm(&appointment, caller)?;
        self.lifecycle_service
            .validate_status_transition(&appointment.status, &AppointmentStatus::Confirmed)?;

        self.apply_status(appointment_id, AppointmentStatus::Confirmed, auth_token).await
    }

    /// pending/confirmed -> cancelled, by either party or an admin.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        caller: &CallerContext,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        AppointmentAuthorization::authorize_cancel(&appointment, caller)?;
        self.lifecycle_service
            .validate_status_transition(&appointment.status, &AppointmentStatus::Cancelled)?;

        self.apply_status(appointment_id, AppointmentStatus::Cancelled, auth_token).await
    }

    /// confirmed -> completed, by the assigned professional or an admin.
    pub async fn complete_appointment(
        &self,
        appointment_id: Uuid,
        caller: &CallerContext,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        AppointmentAuthorization::authorize_complete(&appointment, caller)?;
        self.lifecycle_service
            .validate_status_transition(&appointment.status, &AppointmentStatus::Completed)?;

        self.apply_status(appointment_id, AppointmentStatus::Completed, auth_token).await
    }

    /// Move the scheduled time; the status is left unchanged.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        caller: &CallerContext,
        new_date_time: chrono::DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        AppointmentAuthorization::authorize_reschedule(&appointment, caller)?;
        self.lifecycle_service
            .validate_reschedule(&appointment.status, new_date_time, Utc::now())?;

        info!("Rescheduling appointment {} to {}", appointment_id, new_date_time);

        let update_data = json!({
            "date": new_date_time.to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_appointment(appointment_id, update_data, auth_token).await
    }

    pub async fn search_appointments(
        &self,
        query: AppointmentSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Searching appointments with query: {:?}", query);

        // PostgREST rejects negative paging values with an opaque error.
        if query.limit.is_some_and(|limit| limit < 0)
            || query.offset.is_some_and(|offset| offset < 0)
        {
            return Err(AppointmentError::Validation(
                "limit and offset must be non-negative".to_string(),
            ));
        }

        let mut query_parts = vec![];

        if let Some(client_id) = query.client_id {
            query_parts.push(format!("client_id=eq.{}", client_id));
        }
        if let Some(professional_id) = query.professional_id {
            query_parts.push(format!("professional_id=eq.{}", professional_id));
        }
        if let Some(status) = query.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(from_date) = query.from_date {
            query_parts.push(format!("date=gte.{}", from_date.to_rfc3339()));
        }
        if let Some(to_date) = query.to_date {
            query_parts.push(format!("date=lte.{}", to_date.to_rfc3339()));
        }

        query_parts.push("order=date.asc".to_string());
        query_parts.push(format!("limit={}", query.limit.unwrap_or(50)));
        query_parts.push(format!("offset={}", query.offset.unwrap_or(0)));

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));

        self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::Store(e.to_string()))
    }

    /// Write a validated status transition back to the store.
    async fn apply_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Transitioning appointment {} to {}", appointment_id, new_status);

        let update_data = json!({
            "status": new_status,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_appointment(appointment_id, update_data, auth_token).await
    }

    async fn patch_appointment(
        &self,
        appointment_id: Uuid,
        update_data: Value,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);

        let updated: Vec<Appointment> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(Self::representation_headers()),
        ).await.map_err(|e| AppointmentError::Store(e.to_string()))?;

        updated.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    async fn verify_reference(
        &self,
        table: &str,
        record_id: &Uuid,
        missing: AppointmentError,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/{}?id=eq.{}&select=id", table, record_id);

        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::Store(e.to_string()))?;

        if rows.is_empty() {
            return Err(missing);
        }

        Ok(())
    }
}
