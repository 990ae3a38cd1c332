use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use super::storage_error;
use crate::api::response::{ApiError, JSend};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub uploads_deleted: u64,
    pub users_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let stats = state.db.purge_all().map_err(storage_error)?;

    tracing::warn!(uploads = stats.uploads, users = stats.users, "Purged all data");

    Ok(JSend::success(PurgeResponse {
        uploads_deleted: stats.uploads,
        users_deleted: stats.users,
    }))
}
