use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use serde_json::{json, Value};
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};
use uuid::Uuid;

use auth_cell::router::auth_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils, MockStoreResponses};

fn test_config(mock_server: &MockServer) -> AppConfig {
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();
    config
}

fn create_test_app(config: AppConfig) -> Router {
    auth_routes(Arc::new(config))
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_validate_endpoint_accepts_valid_token() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let app = create_test_app(config);
    let response = app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/validate")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["user_id"], json!(user.id));
}

#[tokio::test]
async fn test_validate_endpoint_rejects_expired_token() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_expired_token(&user, &config.supabase_jwt_secret);

    let app = create_test_app(config);
    let response = app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/validate")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_returns_directory_record() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let user = TestUser::professional("pro@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let professional_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user.id,
            "email": user.email,
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("user_id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::professional_record(&professional_id, &user.id, &user.email)
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config);
    let response = app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/profile")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["user_id"], json!(user.id));
    assert_eq!(body["directory_profile"]["id"], json!(professional_id));
}

#[tokio::test]
async fn test_profile_requires_authentication() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);

    let app = create_test_app(config);
    let response = app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/profile")
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
