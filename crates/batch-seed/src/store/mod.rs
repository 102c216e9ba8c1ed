//! The store contract consumed by the seeder, and its implementations.
//!
//! A store buffers staged records, writes them durably on [`SeedStore::commit`],
//! and drops its in-memory handles on [`SeedStore::release`]. Records that
//! are needed again after a release are resolved through
//! [`SeedStore::reattach`].

mod handle;
mod memory;
mod postgres;
mod unit_of_work;

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{RecordId, SeedRecord};

pub use handle::RecordHandle;
pub use memory::MemoryStore;
pub use postgres::{PgStore, migrate};
pub use unit_of_work::{StagedRow, UnitOfWork};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Malformed {kind} record {id}: {reason}")]
    Staging {
        kind: &'static str,
        id: RecordId,
        reason: String,
    },

    #[error("Commit failed: {0}")]
    Commit(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Access through a handle whose record has been released.
    #[error("Record {id} is detached from the store")]
    Detached { id: RecordId },

    #[error("{kind} record {id} not found")]
    NotFound { kind: &'static str, id: RecordId },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Wraps any error as a commit failure.
    pub fn commit(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError::Commit(err.into())
    }
}

/// Backing store for a seeding run.
///
/// A store is exclusively borrowed by one run at a time; implementations
/// need not be reentrant.
#[async_trait]
pub trait SeedStore: Send {
    /// Buffers a record for the next commit.
    fn stage<R: SeedRecord>(&mut self, record: R) -> Result<RecordHandle<R>, StoreError>;

    /// Durably writes every record staged since the last commit.
    ///
    /// Returns the number of records written.
    async fn commit(&mut self) -> Result<usize, StoreError>;

    /// Invalidates every in-memory handle the store has given out.
    fn release(&mut self);

    /// Resolves a committed record by identity.
    async fn reattach<R: SeedRecord>(
        &mut self,
        id: RecordId,
    ) -> Result<RecordHandle<R>, StoreError>;

    /// Number of records staged and not yet committed.
    fn staged_len(&self) -> usize;
}
