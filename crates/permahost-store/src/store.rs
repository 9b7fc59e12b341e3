//! redb-backed repository store.

use std::path::Path;

use permahost_core::RepoRecord;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use tracing::{debug, info};

use crate::error::StoreError;

/// Tracked repositories, keyed by link, valued by the JSON-encoded record.
const REPOS_TABLE: TableDefinition<'_, &'_ str, &'_ [u8]> = TableDefinition::new("repos");

/// Name of the database file inside the store directory.
pub const STORE_FILE: &str = "repos.redb";

/// Durable store of tracked repositories.
///
/// Writers are serialized by the database; readers work on snapshots and
/// never block writers. Operations are short, so callers may use the store
/// from async code directly.
pub struct RepoStore {
    db: Database,
}

impl RepoStore {
    /// Opens (or creates) the store inside `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let path = dir.join(STORE_FILE);
        let db = Database::create(&path)?;

        let txn = db.begin_write()?;
        {
            txn.open_table(REPOS_TABLE)?;
        }
        txn.commit()?;

        info!("Repository store opened at {:?}", path);

        Ok(Self { db })
    }

    /// Writes a record, replacing any previous value for its link.
    pub fn put(&self, record: &RepoRecord) -> Result<(), StoreError> {
        let bytes = encode(record)?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(REPOS_TABLE)?;
            table.insert(record.link(), bytes.as_slice())?;
        }
        txn.commit()?;

        Ok(())
    }

    /// Writes a record only if its link is not tracked yet.
    pub fn insert(&self, record: &RepoRecord) -> Result<(), StoreError> {
        let bytes = encode(record)?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(REPOS_TABLE)?;
            if table.get(record.link())?.is_some() {
                return Err(StoreError::AlreadyExists(record.link().to_string()));
            }
            table.insert(record.link(), bytes.as_slice())?;
        }
        txn.commit()?;

        debug!("Inserted record for {}", record.link());
        Ok(())
    }

    /// Returns the record for `link`.
    pub fn get(&self, link: &str) -> Result<RepoRecord, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REPOS_TABLE)?;

        match table.get(link)? {
            Some(value) => decode(link, value.value()),
            None => Err(StoreError::NotFound(link.to_string())),
        }
    }

    /// Returns true if `link` is tracked.
    pub fn contains(&self, link: &str) -> Result<bool, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REPOS_TABLE)?;
        Ok(table.get(link)?.is_some())
    }

    /// Applies `f` to the current record of `link` and persists the result,
    /// all within one write transaction.
    ///
    /// A link that is not (or no longer) tracked yields `NotFound` and is
    /// never recreated.
    pub fn update<F>(&self, link: &str, f: F) -> Result<RepoRecord, StoreError>
    where
        F: FnOnce(&mut RepoRecord),
    {
        let txn = self.db.begin_write()?;
        let record = {
            let mut table = txn.open_table(REPOS_TABLE)?;

            let current = match table.get(link)? {
                Some(value) => value.value().to_vec(),
                None => return Err(StoreError::NotFound(link.to_string())),
            };

            let mut record = decode(link, &current)?;
            f(&mut record);

            let bytes = encode(&record)?;
            table.insert(link, bytes.as_slice())?;
            record
        };
        txn.commit()?;

        Ok(record)
    }

    /// Removes the record for `link`, returning it.
    ///
    /// A record that cannot be decoded is left in place.
    pub fn delete(&self, link: &str) -> Result<RepoRecord, StoreError> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(REPOS_TABLE)?;
            table.remove(link)?.map(|value| value.value().to_vec())
        };

        let Some(bytes) = removed else {
            return Err(StoreError::NotFound(link.to_string()));
        };
        // Dropping the uncommitted transaction aborts the removal.
        let record = decode(link, &bytes)?;
        txn.commit()?;

        debug!("Deleted record for {}", link);
        Ok(record)
    }

    /// Returns every record, in key order, from a single snapshot.
    pub fn list_all(&self) -> Result<Vec<RepoRecord>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REPOS_TABLE)?;

        let mut records = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            records.push(decode(key.value(), value.value())?);
        }

        Ok(records)
    }

    /// Returns the number of tracked repositories.
    pub fn len(&self) -> Result<u64, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REPOS_TABLE)?;
        Ok(table.len()?)
    }

    /// Returns true if no repository is tracked.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Closes the store. Committed writes are already durable.
    pub fn close(self) {
        drop(self.db);
        info!("Repository store closed");
    }
}

impl std::fmt::Debug for RepoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoStore").finish_non_exhaustive()
    }
}

fn encode(record: &RepoRecord) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(record).map_err(StoreError::Encode)
}

fn decode(link: &str, bytes: &[u8]) -> Result<RepoRecord, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::corrupt(link, e.to_string()))
}
