// libs/appointment-cell/src/services/identity.rs
use std::str::FromStr;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{AppointmentError, CallerContext, Role};

/// Resolves an authenticated user into a `CallerContext`.
///
/// This is the single authoritative role-resolution step: a missing or
/// unknown role claim is rejected outright instead of degrading to a
/// default. The caller's client/professional record is looked up by user
/// id; a failed lookup leaves the id unresolved, which downstream guards
/// treat as "not the owner / not the assignee".
pub struct CallerIdentityService {
    supabase: SupabaseClient,
}

impl CallerIdentityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn resolve(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<CallerContext, AppointmentError> {
        let role_claim = user.role.as_deref()
            .ok_or_else(|| AppointmentError::UnknownRole("<missing>".to_string()))?;

        let role = Role::from_str(role_claim)
            .map_err(AppointmentError::UnknownRole)?;

        let (client_id, professional_id) = match role {
            Role::Client => {
                (self.lookup_record_id("clients", &user.id, auth_token).await, None)
            },
            Role::Professional => {
                (None, self.lookup_record_id("professionals", &user.id, auth_token).await)
            },
            Role::Admin => (None, None),
        };

        debug!("Resolved caller {} as {} (client: {:?}, professional: {:?})",
               user.id, role, client_id, professional_id);

        Ok(CallerContext {
            user_id: user.id.clone(),
            role,
            email: user.email.clone(),
            client_id,
            professional_id,
        })
    }

    async fn lookup_record_id(&self, table: &str, user_id: &str, auth_token: &str) -> Option<Uuid> {
        let path = format!("/rest/v1/{}?user_id=eq.{}&select=id", table, user_id);

        let rows: Vec<Value> = match self.supabase.request(Method::GET, &path, Some(auth_token), None).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Lookup in {} failed for user {}: {}", table, user_id, e);
                return None;
            }
        };

        rows.first()
            .and_then(|row| row.get("id"))
            .and_then(|id| id.as_str())
            .and_then(|id| Uuid::parse_str(id).ok())
    }
}
