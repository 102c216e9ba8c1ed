//! Fixture loader for a shop catalog.
//!
//! This crate generates synthetic users, categories and products and seeds
//! them through [`batch_seed`] in bounded-memory batches, so catalogs of
//! hundreds of thousands of products can be loaded for load testing
//! without memory growing with the catalog size.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fixtures::prelude::*;
//!
//! let mut store = PgStore::new(pool);
//! let result = FixturePlan::load_test()
//!     .with_seed(12345)
//!     .seed(&mut store)
//!     .await?;
//! ```

pub mod builders;
pub mod config;
pub mod error;
pub mod generators;

pub use error::FixtureError;

/// Record kinds written by the fixture loader.
pub const FIXTURE_KINDS: [&str; 3] = ["user", "category", "product"];

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::builders::{FixturePlan, PlanMetrics, PlanResult};
    pub use crate::config::FixtureConfig;
    pub use crate::generators::{
        CategoryGenerator, CategoryRef, GeneratedCategory, GeneratedProduct, GeneratedUser,
        ProductGenerator, UserGenerator,
    };
    pub use crate::{FIXTURE_KINDS, FixtureError};
    pub use batch_seed::prelude::*;
}
