use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::StoreError;
use crate::record::{RecordId, SeedRecord};

/// Release generation shared by a unit of work and the handles it issues.
pub(crate) type Epoch = Arc<AtomicU64>;

/// In-process reference to a record managed by a store.
///
/// The handle does not keep the record alive, and no strong reference to
/// the record ever leaves it. Once the store releases its records, every
/// access fails with [`StoreError::Detached`].
pub struct RecordHandle<R> {
    id: RecordId,
    record: Weak<R>,
    epoch: Epoch,
    issued: u64,
}

impl<R: SeedRecord> RecordHandle<R> {
    pub(crate) fn new(id: RecordId, record: Weak<R>, epoch: Epoch) -> Self {
        let issued = epoch.load(Ordering::Acquire);
        Self {
            id,
            record,
            epoch,
            issued,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Runs `f` against the record if the store still manages it.
    pub fn with<T>(&self, f: impl FnOnce(&R) -> T) -> Result<T, StoreError> {
        if !self.is_current() {
            return Err(StoreError::Detached { id: self.id });
        }
        let record = self
            .record
            .upgrade()
            .ok_or(StoreError::Detached { id: self.id })?;
        Ok(f(&record))
    }

    /// Copies the record out of the store.
    pub fn cloned(&self) -> Result<R, StoreError>
    where
        R: Clone,
    {
        self.with(R::clone)
    }

    pub fn is_attached(&self) -> bool {
        self.is_current() && self.record.strong_count() > 0
    }

    fn is_current(&self) -> bool {
        self.epoch.load(Ordering::Acquire) == self.issued
    }
}

impl<R> Clone for RecordHandle<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            record: self.record.clone(),
            epoch: self.epoch.clone(),
            issued: self.issued,
        }
    }
}

impl<R> fmt::Debug for RecordHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordHandle")
            .field("id", &self.id)
            .field("issued", &self.issued)
            .finish()
    }
}
