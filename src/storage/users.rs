use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::UserRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Register a user. Fails with `Conflict` if the email is already taken.
    pub fn create_user(&self, email: &str) -> Result<UserRecord, DatabaseError> {
        debug_assert!(!email.is_empty(), "email must not be empty");

        let write_txn = self.begin_write()?;
        let user = {
            let mut email_table = write_txn.open_table(USER_EMAILS)?;
            if email_table.get(email)?.is_some() {
                return Err(DatabaseError::Conflict(format!(
                    "email '{email}' is already registered"
                )));
            }

            let mut users_table = write_txn.open_table(USERS)?;
            let id = users_table
                .last()?
                .map(|(k, _)| k.value() + 1)
                .unwrap_or(1);

            let user = UserRecord {
                id,
                email: email.to_string(),
            };
            let data = rmp_serde::to_vec_named(&user)?;
            users_table.insert(id, data.as_slice())?;
            email_table.insert(email, id)?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// Exact-match lookup by email; a miss is not an error.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let email_table = read_txn.open_table(USER_EMAILS)?;

        let id = match email_table.get(email)? {
            Some(data) => data.value(),
            None => return Ok(None),
        };

        let users_table = read_txn.open_table(USERS)?;
        match users_table.get(id)? {
            Some(data) => {
                let user: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}
