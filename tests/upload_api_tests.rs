//! Handler-level tests: the axum extractors are plain tuple structs, so the
//! handlers can be exercised directly against a real database and object
//! store without standing up an HTTP server.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;

use upload_archive::api::handlers::queries::{latest_data, search_by_date, SearchByDateParams};
use upload_archive::api::handlers::uploads::{store_upload, UploadParams};
use upload_archive::api::handlers::users::{create_user as create_user_handler, CreateUserRequest};
use upload_archive::api::response::{ApiError, AppForm, AppQuery};
use upload_archive::config::{Config, ServerConfig, StorageConfig};
use upload_archive::object_store::LocalStore;
use upload_archive::storage::Database;
use upload_archive::AppState;

fn test_state(dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = dir.path().join("data");
    let upload_dir = dir.path().join("uploads");

    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        storage: StorageConfig {
            upload_dir: upload_dir.to_string_lossy().to_string(),
        },
        test_mode: true,
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let object_store = LocalStore::new(&upload_dir).expect("Failed to create test object store");

    Arc::new(AppState {
        config,
        db,
        object_store: Arc::new(object_store),
    })
}

fn upload_params(filename: &str, email: &str) -> UploadParams {
    UploadParams {
        data: Bytes::from("Hello, World!"),
        filename: filename.to_string(),
        period_start: "01.07.2023".to_string(),
        period_end: "02.07.2023".to_string(),
        data_type: "Test".to_string(),
        email: email.to_string(),
    }
}

// ============================================================================
// Upload tests
// ============================================================================

#[tokio::test]
async fn test_upload_creates_user_and_record() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let response = store_upload(&state, upload_params("data.csv", "test@example.com"))
        .await
        .unwrap();
    assert_eq!(response.message, "File uploaded successfully");

    let user = state
        .db
        .find_user_by_email("test@example.com")
        .unwrap()
        .expect("user should have been created");
    let record = state
        .db
        .get_upload_by_filename("data.csv")
        .unwrap()
        .expect("record should have been created");
    assert_eq!(record.owner_user_id, user.id);
    assert_eq!(record.data_type, "Test");

    // The bytes landed in the upload directory
    assert!(dir.path().join("uploads").join("data.csv").exists());
}

#[tokio::test]
async fn test_two_uploads_same_email_create_one_user() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    store_upload(&state, upload_params("first.csv", "test@example.com"))
        .await
        .unwrap();
    store_upload(&state, upload_params("second.csv", "test@example.com"))
        .await
        .unwrap();

    let user = state
        .db
        .find_user_by_email("test@example.com")
        .unwrap()
        .unwrap();
    assert_eq!(user.id, 1);

    let first = state.db.get_upload_by_filename("first.csv").unwrap().unwrap();
    let second = state
        .db
        .get_upload_by_filename("second.csv")
        .unwrap()
        .unwrap();
    assert_eq!(first.owner_user_id, user.id);
    assert_eq!(second.owner_user_id, user.id);
}

#[tokio::test]
async fn test_duplicate_filename_is_soft_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    store_upload(&state, upload_params("dup.csv", "first@example.com"))
        .await
        .unwrap();

    // Same filename from a different sender: acknowledged, nothing written
    let response = store_upload(&state, upload_params("dup.csv", "second@example.com"))
        .await
        .unwrap();
    assert_eq!(response.message, "File already uploaded");

    assert!(state
        .db
        .find_user_by_email("second@example.com")
        .unwrap()
        .is_none());
    let latest = state.db.find_latest_per_user().unwrap();
    assert_eq!(latest.len(), 1);
}

#[tokio::test]
async fn test_upload_rejects_malformed_date() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let mut params = upload_params("bad-date.csv", "test@example.com");
    params.period_start = "2023-07-01".to_string();

    let err = store_upload(&state, params).await.unwrap_err();
    assert!(matches!(err, ApiError::Fail(StatusCode::BAD_REQUEST, _)));

    // Rejected before any side effect
    assert!(!dir.path().join("uploads").join("bad-date.csv").exists());
    assert!(state
        .db
        .find_user_by_email("test@example.com")
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_upload_rejects_malformed_email() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let err = store_upload(&state, upload_params("no-email.csv", "not-an-email"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Fail(StatusCode::BAD_REQUEST, _)));

    assert!(!dir.path().join("uploads").join("no-email.csv").exists());
}

#[tokio::test]
async fn test_upload_rejects_path_traversal_filename() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let err = store_upload(&state, upload_params("../escape.csv", "test@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Fail(StatusCode::BAD_REQUEST, _)));
}

#[tokio::test]
async fn test_upload_reuses_existing_user() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    // User registered ahead of time via the explicit endpoint path
    let existing = state.db.create_user("test@example.com").unwrap();

    // The duplicate email must never surface as an upload error
    store_upload(&state, upload_params("reuse.csv", "test@example.com"))
        .await
        .unwrap();

    let record = state.db.get_upload_by_filename("reuse.csv").unwrap().unwrap();
    assert_eq!(record.owner_user_id, existing.id);
}

// ============================================================================
// Query tests
// ============================================================================

#[tokio::test]
async fn test_dates_round_trip_through_search() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let mut params = upload_params("june.csv", "test@example.com");
    params.period_start = "15.06.2023".to_string();
    params.period_end = "16.06.2023".to_string();
    store_upload(&state, params).await.unwrap();

    let Json(body) = search_by_date(
        State(Arc::clone(&state)),
        AppQuery(SearchByDateParams {
            period_start: "01.06.2023".to_string(),
            period_end: "30.06.2023".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body.data.len(), 1);
    assert_eq!(body.data[0].period_start, "15.06.2023");
    assert_eq!(body.data[0].period_end, "16.06.2023");
    assert_eq!(body.data[0].filename, "june.csv");
    assert_eq!(body.data[0].user_id, 1);
}

#[tokio::test]
async fn test_search_excludes_overlapping_records() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let mut params = upload_params("spill.csv", "test@example.com");
    params.period_start = "31.12.2022".to_string();
    params.period_end = "02.01.2023".to_string();
    store_upload(&state, params).await.unwrap();

    let Json(body) = search_by_date(
        State(Arc::clone(&state)),
        AppQuery(SearchByDateParams {
            period_start: "01.01.2023".to_string(),
            period_end: "02.01.2023".to_string(),
        }),
    )
    .await
    .unwrap();

    assert!(body.data.is_empty());
}

#[tokio::test]
async fn test_search_rejects_malformed_dates() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let err = search_by_date(
        State(Arc::clone(&state)),
        AppQuery(SearchByDateParams {
            period_start: "01/01/2023".to_string(),
            period_end: "02.01.2023".to_string(),
        }),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::Fail(StatusCode::BAD_REQUEST, _)));
}

#[tokio::test]
async fn test_latest_data_formats_dates_consistently() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    store_upload(&state, upload_params("old.csv", "test@example.com"))
        .await
        .unwrap();
    store_upload(&state, upload_params("new.csv", "test@example.com"))
        .await
        .unwrap();

    let Json(body) = latest_data(State(Arc::clone(&state))).await.unwrap();

    assert_eq!(body.data.len(), 1);
    assert_eq!(body.data[0].filename, "new.csv");
    // Same external representation as the range query
    assert_eq!(body.data[0].period_start, "01.07.2023");
    assert_eq!(body.data[0].period_end, "02.07.2023");

    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["status"], "success");
}

// ============================================================================
// User endpoint tests
// ============================================================================

#[tokio::test]
async fn test_create_user_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let Json(body) = create_user_handler(
        State(Arc::clone(&state)),
        AppForm(CreateUserRequest {
            email: "new@example.com".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body.data.message, "User created successfully");
    assert_eq!(body.data.user_id, 1);
}

#[tokio::test]
async fn test_create_user_endpoint_duplicate_email_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    state.db.create_user("taken@example.com").unwrap();

    let err = create_user_handler(
        State(Arc::clone(&state)),
        AppForm(CreateUserRequest {
            email: "taken@example.com".to_string(),
        }),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::Fail(StatusCode::CONFLICT, _)));
}

#[tokio::test]
async fn test_create_user_endpoint_rejects_malformed_email() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let err = create_user_handler(
        State(Arc::clone(&state)),
        AppForm(CreateUserRequest {
            email: "definitely not an email".to_string(),
        }),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::Fail(StatusCode::BAD_REQUEST, _)));
}
