//! Identity map and staging buffer shared by the store implementations.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::debug;

use super::handle::Epoch;
use super::{RecordHandle, StoreError};
use crate::record::{RecordId, SeedRecord};

/// A staged record, serialized and ready to be written.
#[derive(Debug, Clone)]
pub struct StagedRow {
    pub kind: &'static str,
    pub id: RecordId,
    pub body: serde_json::Value,
}

type ManagedRecord = Arc<dyn Any + Send + Sync>;

/// Tracks the records a store currently manages.
///
/// The unit of work holds the strong reference to each managed record;
/// handles given out are weak and stamped with the current release epoch.
/// Clearing it bumps the epoch, detaching every handle at once.
#[derive(Default)]
pub struct UnitOfWork {
    staged: Vec<StagedRow>,
    managed: HashMap<(&'static str, RecordId), ManagedRecord>,
    peak_staged: usize,
    epoch: Epoch,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates, serializes and buffers a record.
    pub fn stage<R: SeedRecord>(&mut self, record: R) -> Result<RecordHandle<R>, StoreError> {
        let id = record.id();

        record.validate().map_err(|reason| StoreError::Staging {
            kind: R::KIND,
            id,
            reason,
        })?;

        if self.managed.contains_key(&(R::KIND, id)) {
            return Err(StoreError::Staging {
                kind: R::KIND,
                id,
                reason: "record is already managed".to_string(),
            });
        }

        let body = serde_json::to_value(&record)?;
        self.staged.push(StagedRow {
            kind: R::KIND,
            id,
            body,
        });
        self.peak_staged = self.peak_staged.max(self.staged.len());

        Ok(self.manage(record))
    }

    /// Puts a record under management without staging it.
    pub fn manage<R: SeedRecord>(&mut self, record: R) -> RecordHandle<R> {
        let id = record.id();
        let record = Arc::new(record);
        let handle = RecordHandle::new(id, Arc::downgrade(&record), self.epoch.clone());
        self.managed.insert((R::KIND, id), record as ManagedRecord);
        handle
    }

    /// Handle to a record that is still managed, if any.
    pub fn lookup<R: SeedRecord>(&self, id: RecordId) -> Option<RecordHandle<R>> {
        let record = self.managed.get(&(R::KIND, id))?.clone();
        let record = record.downcast::<R>().ok()?;
        Some(RecordHandle::new(
            id,
            Arc::downgrade(&record),
            self.epoch.clone(),
        ))
    }

    /// Drains the staging buffer for a commit.
    pub fn take_staged(&mut self) -> Vec<StagedRow> {
        std::mem::take(&mut self.staged)
    }

    /// Detaches every managed record and returns buffer memory.
    pub fn clear(&mut self) {
        debug!(
            "Releasing {} managed records ({} staged)",
            self.managed.len(),
            self.staged.len()
        );
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.staged = Vec::new();
        self.managed = HashMap::new();
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    pub fn managed_len(&self) -> usize {
        self.managed.len()
    }

    /// Largest staging buffer seen since the unit of work was created.
    pub fn peak_staged(&self) -> usize {
        self.peak_staged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Tag {
        id: Uuid,
        label: String,
    }

    impl SeedRecord for Tag {
        const KIND: &'static str = "tag";

        fn id(&self) -> RecordId {
            self.id
        }

        fn validate(&self) -> Result<(), String> {
            if self.label.is_empty() {
                return Err("label must not be empty".to_string());
            }
            Ok(())
        }
    }

    fn tag(n: u128, label: &str) -> Tag {
        Tag {
            id: Uuid::from_u128(n),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_stage_serializes_and_manages() {
        let mut uow = UnitOfWork::new();
        let handle = uow.stage(tag(1, "alpha")).unwrap();

        assert_eq!(uow.staged_len(), 1);
        assert_eq!(uow.managed_len(), 1);
        assert_eq!(handle.with(|t| t.label.clone()).unwrap(), "alpha");

        let rows = uow.take_staged();
        assert_eq!(rows[0].kind, "tag");
        assert_eq!(rows[0].body["label"], "alpha");
        assert_eq!(uow.staged_len(), 0);
        // Committed rows stay managed until cleared
        assert!(handle.is_attached());
    }

    #[test]
    fn test_stage_rejects_invalid_and_duplicate() {
        let mut uow = UnitOfWork::new();

        let err = uow.stage(tag(1, "")).unwrap_err();
        assert!(matches!(err, StoreError::Staging { kind: "tag", .. }));

        uow.stage(tag(2, "beta")).unwrap();
        let err = uow.stage(tag(2, "beta again")).unwrap_err();
        assert!(matches!(err, StoreError::Staging { .. }));
        assert_eq!(uow.staged_len(), 1);
    }

    #[test]
    fn test_clear_detaches_handles() {
        let mut uow = UnitOfWork::new();
        let handle = uow.stage(tag(3, "gamma")).unwrap();

        uow.clear();

        assert!(!handle.is_attached());
        assert!(matches!(
            handle.with(|t| t.label.len()),
            Err(StoreError::Detached { .. })
        ));
        assert!(uow.lookup::<Tag>(handle.id()).is_none());
    }

    #[test]
    fn test_clear_detaches_handles_even_if_record_is_still_referenced() {
        let mut uow = UnitOfWork::new();
        let handle = uow.stage(tag(4, "delta")).unwrap();
        let kept = uow.managed[&("tag", handle.id())].clone();

        uow.clear();

        assert!(kept.downcast_ref::<Tag>().is_some());
        assert!(!handle.is_attached());
        assert!(matches!(
            handle.with(|t| t.label.clone()),
            Err(StoreError::Detached { .. })
        ));
    }

    #[test]
    fn test_peak_staged_tracks_high_water_mark() {
        let mut uow = UnitOfWork::new();
        for n in 0..5 {
            uow.stage(tag(n, "x")).unwrap();
        }
        uow.take_staged();
        uow.stage(tag(10, "y")).unwrap();

        assert_eq!(uow.peak_staged(), 5);
        assert_eq!(uow.staged_len(), 1);
    }
}
