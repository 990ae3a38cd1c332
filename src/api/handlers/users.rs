use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::ValidateEmail;

use super::storage_error;
use crate::api::response::{ApiError, AppForm, JSend};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub message: String,
    pub user_id: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a user explicitly. Unlike the upload path, a duplicate email
/// here is a 409.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AppForm(req): AppForm<CreateUserRequest>,
) -> Result<Json<JSend<CreateUserResponse>>, ApiError> {
    if !req.email.validate_email() {
        return Err(ApiError::bad_request(format!(
            "'{}' is not a valid email address",
            req.email
        )));
    }

    let user = state.db.create_user(&req.email).map_err(storage_error)?;

    tracing::info!(user_id = user.id, "User created");
    Ok(JSend::success(CreateUserResponse {
        message: "User created successfully".to_string(),
        user_id: user.id,
    }))
}
