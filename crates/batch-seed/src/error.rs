//! Errors surfaced by a seeding run.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SeedError {
    /// Bad count or batch size. Caller bug, not retriable.
    #[error("Invalid seed spec: {0}")]
    InvalidSpec(String),

    /// The store already had records staged when the run started.
    #[error("Store has {staged} records staged from outside the run")]
    StoreBusy { staged: usize },

    #[error("Factory failed for record {index}: {source}")]
    Factory {
        index: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error("Staging failed for record {index}: {source}")]
    Staging {
        index: u64,
        #[source]
        source: StoreError,
    },

    /// The store rejected a commit. `committed` records are durable.
    #[error("Commit of batch {batch} failed after {committed} committed records: {source}")]
    CommitFailed {
        batch: u64,
        committed: u64,
        #[source]
        source: StoreError,
    },
}

impl SeedError {
    /// Cumulative count of durably committed records, when the run got that far.
    pub fn committed(&self) -> Option<u64> {
        match self {
            SeedError::CommitFailed { committed, .. } => Some(*committed),
            _ => None,
        }
    }
}
