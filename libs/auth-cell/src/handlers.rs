// libs/auth-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{State, Extension},
    http::HeaderMap,
    Json,
};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::jwt;

// Helper function to extract token
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    Ok(auth_value[7..].to_string())
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;

    match jwt::validate_token(&token, &config.supabase_jwt_secret) {
        Ok(user) => {
            let response = TokenResponse {
                valid: true,
                user_id: user.id,
                email: user.email,
                role: user.role,
            };

            Ok(Json(response))
        },
        Err(err) => {
            Err(AppError::Auth(err))
        }
    }
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = extract_bearer_token(&headers)?;

    match jwt::validate_token(&token, &config.supabase_jwt_secret) {
        Ok(_) => Ok(Json(json!({ "valid": true }))),
        Err(_) => Ok(Json(json!({ "valid": false }))),
    }
}

/// Caller's auth record plus their client or professional directory row.
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Getting profile for user: {}", user.id);

    let token = extract_bearer_token(&headers)?;

    let client = SupabaseClient::new(&config);

    let auth_profile = client.get_user_profile(&user.id, &token)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    let directory_table = match user.role.as_deref() {
        Some("professional") => "professionals",
        _ => "clients",
    };

    let path = format!("/rest/v1/{}?user_id=eq.{}", directory_table, user.id);
    let records: Vec<Value> = client.request(Method::GET, &path, Some(&token), None)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    let directory_profile = records.into_iter().next()
        .unwrap_or_else(|| json!({ "user_id": user.id, "exists": false }));

    Ok(Json(json!({
        "user_id": user.id,
        "role": user.role,
        "auth_profile": auth_profile,
        "directory_profile": directory_profile
    })))
}
