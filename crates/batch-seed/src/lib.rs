//! Bounded-memory batch seeding.
//!
//! This crate drives the generation and persistence of large numbers of
//! synthetic records without peak memory growing with the total count.
//! Records are produced by a factory, staged into a [`SeedStore`], and
//! committed in fixed-size batches. After every commit the store releases
//! its in-memory handles, so nothing from a finished batch stays reachable.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use batch_seed::prelude::*;
//!
//! let spec = SeedSpec::new(1_000, 100, |index, rng| Ok(Widget::random(index, rng)))
//!     .with_seed(12345);
//!
//! let mut store = MemoryStore::new();
//! let mut run = BoundedBatchSeeder::new().run(spec, &mut store)?;
//!
//! while let Some(report) = run.next_batch().await {
//!     let report = report?;
//!     tracing::info!("batch {} -> {} records", report.batch, report.cumulative);
//! }
//! ```

pub mod error;
pub mod memory;
pub mod record;
pub mod seeder;
pub mod spec;
pub mod store;

pub use error::SeedError;
pub use record::{RecordId, SeedRecord};
pub use seeder::{BatchReport, BoundedBatchSeeder, RunSummary, SeedRun};
pub use spec::SeedSpec;
pub use store::{MemoryStore, PgStore, RecordHandle, SeedStore, StoreError, migrate};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::memory::{MemoryProbe, MemorySample};
    pub use crate::record::{RecordId, SeedRecord, record_id};
    pub use crate::seeder::{BatchReport, BoundedBatchSeeder, RunSummary, SeedRun};
    pub use crate::spec::SeedSpec;
    pub use crate::store::{MemoryStore, PgStore, RecordHandle, SeedStore, StoreError};
    pub use crate::SeedError;
}
