use std::collections::BTreeMap;

use chrono::NaiveDate;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{NewUpload, UploadRecord};
use super::tables::*;

impl Database {
    // ========================================================================
    // Upload record operations
    // ========================================================================

    /// Create an upload record. Fails with `Conflict` if the filename is
    /// already taken and `NotFound` if the owner does not exist. Early error
    /// returns drop the write transaction, so nothing is partially written.
    pub fn create_upload(&self, new: &NewUpload) -> Result<UploadRecord, DatabaseError> {
        debug_assert!(!new.filename.is_empty(), "filename must not be empty");

        let write_txn = self.begin_write()?;
        let record = {
            let mut filename_table = write_txn.open_table(UPLOAD_FILENAMES)?;
            if filename_table.get(new.filename.as_str())?.is_some() {
                return Err(DatabaseError::Conflict(format!(
                    "filename '{}' is already uploaded",
                    new.filename
                )));
            }

            let users_table = write_txn.open_table(USERS)?;
            if users_table.get(new.owner_user_id)?.is_none() {
                return Err(DatabaseError::NotFound(format!(
                    "user {} does not exist",
                    new.owner_user_id
                )));
            }

            let mut uploads_table = write_txn.open_table(UPLOADS)?;
            let id = uploads_table
                .last()?
                .map(|(k, _)| k.value() + 1)
                .unwrap_or(1);

            let record = UploadRecord {
                id,
                filename: new.filename.clone(),
                storage_path: new.storage_path.clone(),
                period_start: new.period_start,
                period_end: new.period_end,
                data_type: new.data_type.clone(),
                owner_user_id: new.owner_user_id,
            };
            let data = rmp_serde::to_vec_named(&record)?;
            uploads_table.insert(id, data.as_slice())?;
            filename_table.insert(new.filename.as_str(), id)?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Check whether a filename has already been uploaded. The filename
    /// index, not the filesystem, is the source of truth for duplicates.
    pub fn filename_exists(&self, filename: &str) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(UPLOAD_FILENAMES)?;
        Ok(table.get(filename)?.is_some())
    }

    /// Get an upload record by filename (resolves filename -> id -> record)
    pub fn get_upload_by_filename(
        &self,
        filename: &str,
    ) -> Result<Option<UploadRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let filename_table = read_txn.open_table(UPLOAD_FILENAMES)?;

        let id = match filename_table.get(filename)? {
            Some(data) => data.value(),
            None => return Ok(None),
        };

        let uploads_table = read_txn.open_table(UPLOADS)?;
        match uploads_table.get(id)? {
            Some(data) => {
                let record: UploadRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Find records whose span lies fully inside the query span, inclusive.
    /// Containment, not overlap: a record reaching outside the bounds on
    /// either side is excluded. Results come back in ascending-id order.
    pub fn find_uploads_in_range(
        &self,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<UploadRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(UPLOADS)?;

        let mut records = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let record: UploadRecord = rmp_serde::from_slice(value.value())?;
            if record.period_start >= period_start && record.period_end <= period_end {
                records.push(record);
            }
        }

        Ok(records)
    }

    /// For every user with at least one upload, the record with the highest
    /// id. Results come back in ascending owner-id order.
    pub fn find_latest_per_user(&self) -> Result<Vec<UploadRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(UPLOADS)?;

        // Ids iterate ascending, so the last insert per owner wins.
        let mut latest: BTreeMap<u64, UploadRecord> = BTreeMap::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let record: UploadRecord = rmp_serde::from_slice(value.value())?;
            latest.insert(record.owner_user_id, record);
        }

        Ok(latest.into_values().collect())
    }
}
