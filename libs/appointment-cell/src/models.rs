// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub service_id: Uuid,
    /// Scheduled start instant, persisted under the `date` column.
    #[serde(rename = "date")]
    pub date_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Rescheduling is only allowed while the appointment is still live.
    pub fn can_reschedule(&self) -> bool {
        matches!(self.status, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

/// Closed status set. The store never carries any other value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

// ==============================================================================
// CALLER CONTEXT
// ==============================================================================

/// Caller capability classifier. Parsed from the JWT role claim in one
/// authoritative step; an unknown or missing role is an explicit error,
/// never a silent fallback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Professional,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "professional" => Ok(Role::Professional),
            "admin" => Ok(Role::Admin),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Professional => write!(f, "professional"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Per-request caller identity, passed explicitly into every lifecycle
/// operation. The client/professional record ids are resolved from the
/// directory tables; an unresolved id simply never matches ownership.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub user_id: String,
    pub role: Role,
    pub email: Option<String>,
    pub client_id: Option<Uuid>,
    pub professional_id: Option<Uuid>,
}

impl CallerContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub service_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub client_id: Option<Uuid>,
    pub professional_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Client not found")]
    ClientNotFound,

    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidTransition(AppointmentStatus),

    #[error("Not authorized to perform this operation")]
    Forbidden,

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Store error: {0}")]
    Store(String),
}
