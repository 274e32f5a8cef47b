mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use warppay_backend::entities::users;

use crate::common::{sample_user, test_state, StubRpc, TEST_WALLET};

fn request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn app_state_stays_cloneable_over_a_mocked_connection() {
    // State cloning must not hinge on DatabaseConnection deriving Clone,
    // which goes away when the mock driver is compiled in.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results::<users::Model, _, _>([vec![]])
        .into_connection();
    let state = test_state(db, Arc::new(StubRpc::new()));
    let cloned = state.clone();

    let persister = warppay_backend::services::preorder::DbCardPersister::new(
        cloned.db.clone(),
        cloned.profiles.clone(),
    );
    let _ = persister.clone();

    let app = warppay_backend::router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/users?walletAddress={}", TEST_WALLET))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_user_rejects_bad_username() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = warppay_backend::router(test_state(db, Arc::new(StubRpc::new())));

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/users",
            json!({
                "walletAddress": TEST_WALLET,
                "username": "no spaces allowed",
                "email": "rider@example.com",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_user_rejects_bad_email() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = warppay_backend::router(test_state(db, Arc::new(StubRpc::new())));

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/users",
            json!({
                "walletAddress": TEST_WALLET,
                "username": "warp_rider",
                "email": "not-an-email",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_user_returns_created_profile() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results::<users::Model, _, _>([vec![]]) // wallet lookup
        .append_query_results::<users::Model, _, _>([vec![]]) // username check
        .append_query_results([vec![sample_user(TEST_WALLET)]]) // insert returning
        .into_connection();
    let app = warppay_backend::router(test_state(db, Arc::new(StubRpc::new())));

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/users",
            json!({
                "walletAddress": TEST_WALLET,
                "username": "warp_rider",
                "email": "rider@example.com",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user"]["walletAddress"], json!(TEST_WALLET));
    assert_eq!(
        body["user"]["profilePictureUrl"],
        json!("/images/default-avatar.png")
    );
}

#[tokio::test]
async fn create_user_conflicts_on_existing_wallet() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_user(TEST_WALLET)]])
        .into_connection();
    let app = warppay_backend::router(test_state(db, Arc::new(StubRpc::new())));

    let response = app
        .oneshot(request(
            Method::POST,
            "/api/users",
            json!({
                "walletAddress": TEST_WALLET,
                "username": "warp_rider",
                "email": "rider@example.com",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn get_user_returns_null_envelope_for_unknown_wallet() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results::<users::Model, _, _>([vec![]])
        .into_connection();
    let app = warppay_backend::router(test_state(db, Arc::new(StubRpc::new())));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/users?walletAddress={}", TEST_WALLET))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"], Value::Null);
}

#[tokio::test]
async fn check_username_reports_taken_name() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_user(TEST_WALLET)]])
        .into_connection();
    let app = warppay_backend::router(test_state(db, Arc::new(StubRpc::new())));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/users/check-username?username=warp_rider")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["available"], json!(false));
}

#[tokio::test]
async fn update_user_applies_profile_command() {
    let mut updated = sample_user(TEST_WALLET);
    updated.email = "new@example.com".to_string();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_user(TEST_WALLET)]]) // wallet lookup
        .append_query_results([vec![updated]]) // update returning
        .into_connection();
    let app = warppay_backend::router(test_state(db, Arc::new(StubRpc::new())));

    let response = app
        .oneshot(request(
            Method::PUT,
            "/api/users/update",
            json!({
                "walletAddress": TEST_WALLET,
                "kind": "profile",
                "email": "new@example.com",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], json!("new@example.com"));
}

#[tokio::test]
async fn update_user_rejects_untagged_payload() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = warppay_backend::router(test_state(db, Arc::new(StubRpc::new())));

    let response = app
        .oneshot(request(
            Method::PUT,
            "/api/users/update",
            json!({
                "walletAddress": TEST_WALLET,
                "username": "warp_rider",
            }),
        ))
        .await
        .unwrap();

    // Missing "kind" tag fails deserialization before any handler logic.
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_user_404s_when_nothing_deleted() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();
    let app = warppay_backend::router(test_state(db, Arc::new(StubRpc::new())));

    let response = app
        .oneshot(request(
            Method::DELETE,
            "/api/users/delete",
            json!({ "walletAddress": TEST_WALLET }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_user_succeeds_and_reports_it() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let app = warppay_backend::router(test_state(db, Arc::new(StubRpc::new())));

    let response = app
        .oneshot(request(
            Method::DELETE,
            "/api/users/delete",
            json!({ "walletAddress": TEST_WALLET }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
}
