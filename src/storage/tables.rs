use redb::TableDefinition;

/// User records: id -> UserRecord (msgpack)
pub const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Email index: email -> user id (enforces one user per email)
pub const USER_EMAILS: TableDefinition<&str, u64> = TableDefinition::new("user_emails");

/// Upload records: id -> UploadRecord (msgpack)
pub const UPLOADS: TableDefinition<u64, &[u8]> = TableDefinition::new("uploads");

/// Filename index: filename -> upload id (enforces global filename uniqueness)
pub const UPLOAD_FILENAMES: TableDefinition<&str, u64> = TableDefinition::new("upload_filenames");
