use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{parse_period_date, storage_error};
use crate::api::response::{ApiError, AppQuery, JSend};
use crate::storage::models::UploadRecord;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchByDateParams {
    pub period_start: String,
    pub period_end: String,
}

#[derive(Debug, Serialize)]
pub struct UploadRecordResponse {
    pub id: u64,
    pub filename: String,
    pub storage_path: String,
    pub period_start: String,
    pub period_end: String,
    pub data_type: String,
    pub user_id: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Records whose span lies fully inside the queried span.
pub async fn search_by_date(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<SearchByDateParams>,
) -> Result<Json<JSend<Vec<UploadRecordResponse>>>, ApiError> {
    let period_start = parse_period_date(&params.period_start, "period_start")?;
    let period_end = parse_period_date(&params.period_end, "period_end")?;

    let records = state
        .db
        .find_uploads_in_range(period_start, period_end)
        .map_err(storage_error)?;

    Ok(JSend::success(
        records.iter().map(upload_to_response).collect(),
    ))
}

/// The most recent upload per user.
pub async fn latest_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<UploadRecordResponse>>>, ApiError> {
    let records = state.db.find_latest_per_user().map_err(storage_error)?;

    Ok(JSend::success(
        records.iter().map(upload_to_response).collect(),
    ))
}

// ============================================================================
// Helpers
// ============================================================================

fn upload_to_response(record: &UploadRecord) -> UploadRecordResponse {
    UploadRecordResponse {
        id: record.id,
        filename: record.filename.clone(),
        storage_path: record.storage_path.clone(),
        period_start: record.period_start.format("%d.%m.%Y").to_string(),
        period_end: record.period_end.format("%d.%m.%Y").to_string(),
        data_type: record.data_type.clone(),
        user_id: record.owner_user_id,
    }
}
