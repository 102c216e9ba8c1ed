use batch_seed::{SeedError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Seeding error: {0}")]
    Seed(#[from] SeedError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid value {value:?} for {key}")]
    Config { key: String, value: String },

    #[error("Products need at least one category")]
    NoCategories,
}
