//! Configuration for the fixture loader.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FixtureError;

/// Configuration for seeding operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureConfig {
    /// PostgreSQL connection string. Without one the loader does a dry run.
    pub database_url: Option<String>,

    /// Number of users to generate.
    pub user_count: u64,

    /// Number of categories to generate.
    pub category_count: u64,

    /// Number of products to generate.
    pub product_count: u64,

    /// Records committed per batch.
    pub batch_size: usize,

    /// RNG seed (for reproducible data).
    pub rng_seed: u64,

    /// Whether to delete previously seeded fixtures first.
    pub purge: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            user_count: 100,
            category_count: 10,
            product_count: 1_000,
            batch_size: 50,
            rng_seed: 12345,
            purge: false,
        }
    }
}

impl FixtureConfig {
    /// Reads the configuration from environment variables.
    ///
    /// Recognised variables: `DATABASE_URL`, `SEED_USERS`, `SEED_CATEGORIES`,
    /// `SEED_PRODUCTS`, `SEED_BATCH_SIZE`, `SEED_RNG_SEED`, `SEED_PURGE`.
    pub fn from_env() -> Result<Self, FixtureError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FixtureError> {
        let defaults = Self::default();

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            user_count: parse_or(&lookup, "SEED_USERS", defaults.user_count)?,
            category_count: parse_or(&lookup, "SEED_CATEGORIES", defaults.category_count)?,
            product_count: parse_or(&lookup, "SEED_PRODUCTS", defaults.product_count)?,
            batch_size: parse_or(&lookup, "SEED_BATCH_SIZE", defaults.batch_size)?,
            rng_seed: parse_or(&lookup, "SEED_RNG_SEED", defaults.rng_seed)?,
            purge: parse_or(&lookup, "SEED_PURGE", defaults.purge)?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, FixtureError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| FixtureError::Config {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
