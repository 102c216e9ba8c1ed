//! In-process store, used for dry runs and tests.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tracing::debug;

use super::{RecordHandle, SeedStore, StoreError, UnitOfWork};
use crate::record::{RecordId, SeedRecord};

/// Store that keeps committed records as serialized rows in memory.
///
/// Committed rows are held as JSON, separate from the identity map, so
/// releasing handles still frees the deserialized records.
#[derive(Default)]
pub struct MemoryStore {
    rows: BTreeMap<(&'static str, RecordId), serde_json::Value>,
    uow: UnitOfWork,
    commits: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed records of `kind`.
    pub fn len(&self, kind: &str) -> usize {
        self.rows.keys().filter(|(k, _)| *k == kind).count()
    }

    /// Total number of committed records.
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, kind: &str, id: RecordId) -> bool {
        self.rows.keys().any(|(k, i)| *k == kind && *i == id)
    }

    /// Committed rows of `kind`, ordered by id.
    pub fn rows<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = (RecordId, &'a serde_json::Value)> + 'a {
        self.rows
            .iter()
            .filter(move |((k, _), _)| *k == kind)
            .map(|((_, id), body)| (*id, body))
    }

    /// Number of successful commits.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Number of records currently held in the identity map.
    pub fn managed_len(&self) -> usize {
        self.uow.managed_len()
    }

    /// Largest staging buffer seen by this store.
    pub fn peak_staged(&self) -> usize {
        self.uow.peak_staged()
    }
}

#[async_trait]
impl SeedStore for MemoryStore {
    fn stage<R: SeedRecord>(&mut self, record: R) -> Result<RecordHandle<R>, StoreError> {
        self.uow.stage(record)
    }

    async fn commit(&mut self) -> Result<usize, StoreError> {
        let staged = self.uow.take_staged();

        // All-or-nothing: check every key before writing any row
        let mut seen = HashSet::with_capacity(staged.len());
        for row in &staged {
            let key = (row.kind, row.id);
            if self.rows.contains_key(&key) || !seen.insert(key) {
                return Err(StoreError::commit(format!(
                    "duplicate key ({}, {})",
                    row.kind, row.id
                )));
            }
        }

        let written = staged.len();
        for row in staged {
            self.rows.insert((row.kind, row.id), row.body);
        }
        self.commits += 1;

        debug!("Committed {} rows to memory store", written);
        Ok(written)
    }

    fn release(&mut self) {
        self.uow.clear();
    }

    async fn reattach<R: SeedRecord>(
        &mut self,
        id: RecordId,
    ) -> Result<RecordHandle<R>, StoreError> {
        if let Some(handle) = self.uow.lookup::<R>(id) {
            return Ok(handle);
        }

        let body = self
            .rows
            .get(&(R::KIND, id))
            .ok_or(StoreError::NotFound { kind: R::KIND, id })?;
        let record: R = serde_json::from_value(body.clone())?;

        Ok(self.uow.manage(record))
    }

    fn staged_len(&self) -> usize {
        self.uow.staged_len()
    }
}
