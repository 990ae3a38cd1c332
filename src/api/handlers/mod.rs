mod admin;
mod content;
pub mod queries;
pub mod uploads;
pub mod users;

use chrono::NaiveDate;

use crate::api::response::ApiError;
use crate::storage::DatabaseError;

pub use admin::{admin_purge, health};
pub use content::serve_upload;
pub use queries::{latest_data, search_by_date};
pub use uploads::upload_file;
pub use users::create_user;

/// Map a DatabaseError to an ApiError
fn storage_error(e: DatabaseError) -> ApiError {
    match e {
        DatabaseError::Conflict(message) => ApiError::conflict(message),
        DatabaseError::NotFound(message) => ApiError::not_found(message),
        _ => ApiError::internal(e.to_string()),
    }
}

/// Parse a `DD.MM.YYYY` date field, rejecting anything else.
fn parse_period_date(value: &str, field: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%d.%m.%Y")
        .map_err(|_| ApiError::bad_request(format!("{field} must be a date in DD.MM.YYYY format")))
}
