//! HTTP contract tests: status codes, error envelope shape, and the
//! create/conflict/delete/revive flow driven through the router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use registry_api::{router, AppState};
use registry_core::testing::InMemoryUserRepository;
use registry_shared::config::{
    AppConfig, AppSettings, CorsSettings, DatabaseSettings, LogSettings, PaginationSettings,
};

fn test_config() -> AppConfig {
    AppConfig {
        app: AppSettings {
            env: "test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            name: "user-registry".into(),
            version: "0.1.0".into(),
        },
        database: DatabaseSettings {
            url: "postgres://unused".into(),
            max_connections: 1,
            min_connections: 1,
        },
        pagination: PaginationSettings {
            default_page_size: 10,
            max_page_size: 100,
        },
        logging: LogSettings {
            hash_secret: "test-secret".into(),
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
    }
}

fn app() -> Router {
    let repo = Arc::new(InMemoryUserRepository::new());
    router(AppState::new(repo, test_config()))
}

fn sample_payload() -> Value {
    json!({
        "name": "John Doe",
        "email": "john.doe@example.com",
        "primary_mobile": "9876543210",
        "secondary_mobile": "8765432109",
        "national_id": "123456789012",
        "tax_id": "ABCDE1234F",
        "date_of_birth": "1990-01-01",
        "place_of_birth": "Mumbai",
        "current_address": "123 Main St, Mumbai, Maharashtra, India",
        "permanent_address": "456 Oak St, Mumbai, Maharashtra, India"
    })
}

fn nth_payload(i: usize) -> Value {
    let mut payload = sample_payload();
    payload["email"] = json!(format!("user{i}@example.com"));
    payload["primary_mobile"] = json!(format!("987654{i:04}"));
    payload["national_id"] = json!(format!("12345678{i:04}"));
    payload["tax_id"] = json!(format!("ABCDE{:04}F", 1230 + i));
    payload
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<&Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, payload: &Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/v1/users", Some(payload)).await
}

#[tokio::test]
async fn health_check_works_without_a_store() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn root_reports_name_and_version() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "user-registry");
    assert_eq!(body["version"], "0.1.0");
}

#[tokio::test]
async fn create_user_returns_201_with_the_record() {
    let app = app();
    let (status, body) = create(&app, &sample_payload()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "john.doe@example.com");
    assert_eq!(body["data"]["is_active"], true);
    assert!(body["data"]["id"].is_string());
    assert!(body["data"]["version"].is_string());
}

#[tokio::test]
async fn duplicate_email_is_a_400_conflict_naming_the_field() {
    let app = app();
    create(&app, &sample_payload()).await;
    let (status, body) = create(&app, &sample_payload()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(body["error"]["message"], "Email already registered");
    assert_eq!(body["error"]["details"][0]["field"], "email");
}

#[tokio::test]
async fn duplicate_mobile_names_the_mobile_field() {
    let app = app();
    create(&app, &sample_payload()).await;

    let mut payload = sample_payload();
    payload["email"] = json!("second@example.com");
    let (status, body) = create(&app, &payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "primary_mobile");
}

#[tokio::test]
async fn malformed_fields_are_rejected_with_422() {
    let app = app();

    let mut payload = sample_payload();
    payload["email"] = json!("invalid-email");
    let (status, body) = create(&app, &payload).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"][0]["field"], "email");

    let mut payload = sample_payload();
    payload["primary_mobile"] = json!("1234567890");
    let (status, _) = create(&app, &payload).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut payload = sample_payload();
    payload["national_id"] = json!("12345");
    let (status, _) = create(&app, &payload).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut payload = sample_payload();
    payload["tax_id"] = json!("INVALID");
    let (status, _) = create(&app, &payload).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn underage_date_of_birth_is_rejected_by_the_engine() {
    let app = app();
    let mut payload = sample_payload();
    payload["date_of_birth"] = json!("2010-01-01");
    let (status, body) = create(&app, &payload).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "date_of_birth");
}

#[tokio::test]
async fn get_user_roundtrip_and_not_found() {
    let app = app();
    let (_, created) = create(&app, &sample_payload()).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/users/3f9bd6a1-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A malformed id is indistinguishable from an unknown one.
    let (status, body) = send(&app, Method::GET, "/api/v1/users/non-existent-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn sparse_update_changes_only_what_was_sent() {
    let app = app();
    let (_, created) = create(&app, &sample_payload()).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let version = created["data"]["version"].as_str().unwrap().to_string();

    let update = json!({ "name": "Jane Doe", "current_address": "789 New St, Mumbai, Maharashtra" });
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/users/{id}"),
        Some(&update),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Jane Doe");
    assert_eq!(body["data"]["current_address"], "789 New St, Mumbai, Maharashtra");
    assert_eq!(body["data"]["email"], "john.doe@example.com");
    assert_ne!(body["data"]["version"], version.as_str());
}

#[tokio::test]
async fn empty_update_returns_the_record_unchanged() {
    let app = app();
    let (_, created) = create(&app, &sample_payload()).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let version = created["data"]["version"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/users/{id}"),
        Some(&json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["version"], version.as_str());
}

#[tokio::test]
async fn update_into_anothers_email_conflicts() {
    let app = app();
    create(&app, &sample_payload()).await;
    let (_, second) = create(&app, &nth_payload(1)).await;
    let id = second["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/users/{id}"),
        Some(&json!({ "email": "john.doe@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(body["error"]["details"][0]["field"], "email");
}

#[tokio::test]
async fn delete_returns_the_snapshot_and_hides_the_record() {
    let app = app();
    let (_, created) = create(&app, &sample_payload()).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::DELETE, &format!("/api/v1/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_deleted"], true);
    assert_eq!(body["data"]["is_active"], false);
    assert!(body["data"]["deleted_at"].is_string());

    let (status, _) = send(&app, Method::GET, &format!("/api/v1/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_paginates_and_bounds_page_size() {
    let app = app();
    for i in 0..15 {
        let (status, _) = create(&app, &nth_payload(i)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/users?page=1&page_size=10",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 15);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 10);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/users?page=2&page_size=10",
        None,
    )
    .await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 5);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/users?page=0&page_size=10",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/users?page=1&page_size=500",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "page_size");
}

#[tokio::test]
async fn search_requires_two_characters_and_matches_substrings() {
    let app = app();
    create(&app, &sample_payload()).await;
    create(&app, &nth_payload(1)).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/users/search?q=x", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "q");

    let (status, body) = send(&app, Method::GET, "/api/v1/users/search?q=john.doe", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["data"][0]["email"], "john.doe@example.com");

    let (_, body) = send(&app, Method::GET, "/api/v1/users/search?q=example.com", None).await;
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn idempotency_key_collapses_retries_over_http() {
    let app = app();
    let mut payload = sample_payload();
    payload["idempotency_key"] = json!("retry-token-9");

    let (status, first) = create(&app, &payload).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, replay) = create(&app, &payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(replay["data"]["id"], first["data"]["id"]);
    // The key is carried in the version token.
    assert_eq!(first["data"]["version"], "retry-token-9");

    let (_, listed) = send(&app, Method::GET, "/api/v1/users", None).await;
    assert_eq!(listed["data"]["total"], 1);
}

#[tokio::test]
async fn deleting_then_recreating_by_email_revives_the_same_record() {
    let app = app();
    let (_, created) = create(&app, &sample_payload()).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    send(&app, Method::DELETE, &format!("/api/v1/users/{id}"), None).await;

    let mut payload = sample_payload();
    payload["primary_mobile"] = json!("9123456780");
    payload["national_id"] = json!("210987654321");
    payload["tax_id"] = json!("FGHIJ5678K");
    let (status, revived) = create(&app, &payload).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(revived["data"]["id"], id.as_str());
    assert_eq!(revived["data"]["is_deleted"], false);
    assert_eq!(revived["data"]["primary_mobile"], "9123456780");
}
