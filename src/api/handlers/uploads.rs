use axum::extract::{Multipart, State};
use axum::Json;
use bytes::{Bytes, BytesMut};
use serde::Serialize;
use std::sync::Arc;
use validator::ValidateEmail;

use super::{parse_period_date, storage_error};
use crate::api::response::{ApiError, JSend};
use crate::storage::models::{NewUpload, UserRecord};
use crate::storage::DatabaseError;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

/// A decoded upload request, independent of the transport that carried it.
#[derive(Debug)]
pub struct UploadParams {
    pub data: Bytes,
    pub filename: String,
    pub period_start: String,
    pub period_end: String,
    pub data_type: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<JSend<UploadResponse>>, ApiError> {
    let mut file_data: Option<BytesMut> = None;
    let mut file_name: Option<String> = None;
    let mut period_start: Option<String> = None;
    let mut period_end: Option<String> = None;
    let mut data_type: Option<String> = None;
    let mut email: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

                if data.len() as u64 > state.config.max_upload_size {
                    return Err(ApiError::payload_too_large(format!(
                        "File exceeds maximum upload size of {} bytes",
                        state.config.max_upload_size
                    )));
                }

                let mut buf = BytesMut::with_capacity(data.len());
                buf.extend_from_slice(&data);
                file_data = Some(buf);
            }
            "period_start" => {
                period_start = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid period_start: {e}")))?,
                );
            }
            "period_end" => {
                period_end = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid period_end: {e}")))?,
                );
            }
            "data_type" => {
                data_type = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid data_type: {e}")))?,
                );
            }
            "email" => {
                email = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid email: {e}")))?,
                );
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let file_data = file_data.ok_or_else(|| ApiError::bad_request("file field is required"))?;
    let file_name = file_name.ok_or_else(|| ApiError::bad_request("file must have a filename"))?;
    let period_start =
        period_start.ok_or_else(|| ApiError::bad_request("period_start field is required"))?;
    let period_end =
        period_end.ok_or_else(|| ApiError::bad_request("period_end field is required"))?;
    let data_type =
        data_type.ok_or_else(|| ApiError::bad_request("data_type field is required"))?;
    let email = email.ok_or_else(|| ApiError::bad_request("email field is required"))?;

    let params = UploadParams {
        data: file_data.freeze(),
        filename: file_name,
        period_start,
        period_end,
        data_type,
        email,
    };

    let response = store_upload(&state, params).await?;
    Ok(JSend::success(response))
}

// ============================================================================
// Orchestration
// ============================================================================

/// Validate an upload, persist its bytes, find-or-create the owning user,
/// and create the upload record. Each check short-circuits before any
/// side effect it guards.
pub async fn store_upload(
    state: &AppState,
    params: UploadParams,
) -> Result<UploadResponse, ApiError> {
    let filename = params.filename.trim();
    if filename.is_empty() {
        return Err(ApiError::bad_request("filename must not be empty"));
    }
    // The filename doubles as the on-disk storage key.
    if filename.contains(['/', '\\']) || filename.contains("..") {
        return Err(ApiError::bad_request(
            "filename must not contain path separators",
        ));
    }

    // Re-uploading a known filename is a soft outcome, not an error.
    if state
        .db
        .filename_exists(filename)
        .map_err(storage_error)?
    {
        tracing::info!(filename, "Duplicate upload ignored");
        return Ok(UploadResponse {
            message: "File already uploaded".to_string(),
        });
    }

    let period_start = parse_period_date(&params.period_start, "period_start")?;
    let period_end = parse_period_date(&params.period_end, "period_end")?;

    if !params.email.validate_email() {
        return Err(ApiError::bad_request(format!(
            "'{}' is not a valid email address",
            params.email
        )));
    }

    state
        .object_store
        .put(filename, params.data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store file: {e}")))?;

    let user = find_or_create_user(state, &params.email)?;

    let storage_path = format!("{}/{}", state.config.storage.upload_dir, filename);
    let new_upload = NewUpload {
        filename: filename.to_string(),
        storage_path,
        period_start,
        period_end,
        data_type: params.data_type,
        owner_user_id: user.id,
    };

    if let Err(e) = state.db.create_upload(&new_upload) {
        // Best-effort cleanup of the written bytes, so a failed insert does
        // not leave an orphaned file behind
        let _ = state.object_store.delete(filename).await;
        return Err(storage_error(e));
    }

    tracing::info!(filename, user_id = user.id, "File uploaded");
    Ok(UploadResponse {
        message: "File uploaded successfully".to_string(),
    })
}

/// Look the user up by email, creating one on a miss. A `Conflict` from the
/// create means a concurrent upload registered the email first; the row it
/// created is reused.
fn find_or_create_user(state: &AppState, email: &str) -> Result<UserRecord, ApiError> {
    if let Some(user) = state.db.find_user_by_email(email).map_err(storage_error)? {
        return Ok(user);
    }

    tracing::info!(email, "Creating user for first upload");
    match state.db.create_user(email) {
        Ok(user) => Ok(user),
        Err(DatabaseError::Conflict(_)) => state
            .db
            .find_user_by_email(email)
            .map_err(storage_error)?
            .ok_or_else(|| ApiError::internal("user missing after email conflict")),
        Err(e) => Err(storage_error(e)),
    }
}
