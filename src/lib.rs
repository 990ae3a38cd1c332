//! upload-archive - A small web service for archiving labeled data files
//!
//! This crate provides file upload tied to a user email and a date range,
//! plus lookup endpoints over the upload history:
//! - REST API with multipart upload support
//! - redb embedded database for upload records (ACID, MVCC, crash-safe)
//! - swappable object storage for raw file bytes (local filesystem)
//! - find-or-create user registration keyed by email

pub mod api;
pub mod config;
pub mod object_store;
pub mod storage;

use std::sync::Arc;

use config::Config;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub object_store: Arc<dyn object_store::ObjectStore>,
}
