use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A registered user, created lazily on first upload or explicitly via the
/// user-creation endpoint. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub email: String,
}

/// An upload record stored in redb. One record per uploaded file; records
/// are immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: u64,
    pub filename: String,
    pub storage_path: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub data_type: String,
    pub owner_user_id: u64,
}

/// Input for creating an upload record. The id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub filename: String,
    pub storage_path: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub data_type: String,
    pub owner_user_id: u64,
}
