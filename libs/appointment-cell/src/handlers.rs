// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use serde::Deserialize;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentSearchQuery, AppointmentStatus, CallerContext,
    CreateAppointmentRequest, RescheduleAppointmentRequest, Role,
};
use crate::services::authorization::AppointmentAuthorization;
use crate::services::booking::AppointmentBookingService;
use crate::services::identity::CallerIdentityService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub client_id: Option<Uuid>,
    pub professional_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl AppointmentQueryParams {
    fn into_search_query(self) -> AppointmentSearchQuery {
        AppointmentSearchQuery {
            client_id: self.client_id,
            professional_id: self.professional_id,
            status: self.status,
            from_date: self.from_date,
            to_date: self.to_date,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

// ==============================================================================
// ERROR MAPPING
// ==============================================================================

/// Errors are recovered here, once, at the operation boundary; nothing
/// below this layer panics or throws across the HTTP surface.
fn to_app_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::ClientNotFound => AppError::NotFound("Client not found".to_string()),
        AppointmentError::ProfessionalNotFound => {
            AppError::NotFound("Professional not found".to_string())
        },
        AppointmentError::ServiceNotFound => AppError::NotFound("Service not found".to_string()),
        AppointmentError::Validation(msg) => AppError::BadRequest(msg),
        AppointmentError::InvalidTransition(status) => {
            AppError::BadRequest(format!("Cannot transition from current status: {}", status))
        },
        AppointmentError::Forbidden => {
            AppError::Auth("Not authorized to perform this operation".to_string())
        },
        AppointmentError::UnknownRole(role) => {
            AppError::Auth(format!("Unknown role: {}", role))
        },
        AppointmentError::Store(msg) => AppError::Database(msg),
    }
}

async fn resolve_caller(
    config: &AppConfig,
    user: &User,
    token: &str,
) -> Result<CallerContext, AppError> {
    CallerIdentityService::new(config)
        .resolve(user, token)
        .await
        .map_err(to_app_error)
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let caller = resolve_caller(&state, &user, token).await?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .create_appointment(request, &caller, token)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let caller = resolve_caller(&state, &user, token).await?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .get_appointment(appointment_id, token)
        .await
        .map_err(to_app_error)?;

    AppointmentAuthorization::authorize_view(&appointment, &caller).map_err(to_app_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let caller = resolve_caller(&state, &user, token).await?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .confirm_appointment(appointment_id, &caller, token)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment confirmed successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let caller = resolve_caller(&state, &user, token).await?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .cancel_appointment(appointment_id, &caller, token)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let caller = resolve_caller(&state, &user, token).await?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .complete_appointment(appointment_id, &caller, token)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment completed successfully"
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let caller = resolve_caller(&state, &user, token).await?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .reschedule_appointment(appointment_id, &caller, request.new_date_time, token)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled successfully"
    })))
}

// ==============================================================================
// SEARCH AND LISTING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<AppointmentQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let caller = resolve_caller(&state, &user, token).await?;

    let limit = params.limit;
    let offset = params.offset;
    let mut search_query = params.into_search_query();

    // Non-admins are force-scoped to their own appointments.
    match caller.role {
        Role::Admin => {},
        Role::Client => {
            match caller.client_id {
                Some(client_id) => search_query.client_id = Some(client_id),
                None => return Ok(empty_listing(limit, offset)),
            }
            search_query.professional_id = None;
        },
        Role::Professional => {
            match caller.professional_id {
                Some(professional_id) => search_query.professional_id = Some(professional_id),
                None => return Ok(empty_listing(limit, offset)),
            }
            search_query.client_id = None;
        },
    }

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .search_appointments(search_query, token)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
        "limit": limit,
        "offset": offset
    })))
}

fn empty_listing(limit: Option<i32>, offset: Option<i32>) -> Json<Value> {
    Json(json!({
        "appointments": [],
        "total": 0,
        "limit": limit,
        "offset": offset
    }))
}

#[axum::debug_handler]
pub async fn get_client_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(client_id): Path<Uuid>,
    Query(params): Query<AppointmentQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let caller = resolve_caller(&state, &user, token).await?;

    let is_own_appointments = caller.role == Role::Client && caller.client_id == Some(client_id);
    if !is_own_appointments && !caller.is_admin() {
        return Err(AppError::Auth("Not authorized to view appointments for this client".to_string()));
    }

    let mut search_query = params.into_search_query();
    search_query.client_id = Some(client_id);
    search_query.professional_id = None;

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .search_appointments(search_query, token)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "client_id": client_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_professional_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
    Query(params): Query<AppointmentQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let caller = resolve_caller(&state, &user, token).await?;

    let is_own_appointments = caller.role == Role::Professional
        && caller.professional_id == Some(professional_id);
    if !is_own_appointments && !caller.is_admin() {
        return Err(AppError::Auth("Not authorized to view appointments for this professional".to_string()));
    }

    let mut search_query = params.into_search_query();
    search_query.professional_id = Some(professional_id);
    search_query.client_id = None;

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .search_appointments(search_query, token)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "professional_id": professional_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}
