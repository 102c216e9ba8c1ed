//! Fluent builder for seeding a complete fixture set.

use std::time::Instant;

use batch_seed::{BoundedBatchSeeder, RecordId, RunSummary, SeedSpec, SeedStore};
use time::OffsetDateTime;
use tracing::info;

use crate::config::FixtureConfig;
use crate::error::FixtureError;
use crate::generators::{
    category::{CategoryGenerator, CategoryRef, GeneratedCategory},
    product::{ProductGenConfig, ProductGenerator},
    user::{UserGenConfig, UserGenerator},
};

/// Per-entity offsets so users, categories and products draw from
/// different RNG streams under the same plan seed.
const USER_STREAM: u64 = 0x5553_4552;
const CATEGORY_STREAM: u64 = 0x4341_5447;
const PRODUCT_STREAM: u64 = 0x5052_4F44;

/// Result of seeding a plan. Entities with a zero count are `None`.
#[derive(Debug)]
pub struct PlanResult {
    pub users: Option<RunSummary>,
    pub categories: Option<RunSummary>,
    pub products: Option<RunSummary>,
    /// Metrics from seeding (populated if metrics tracking enabled).
    pub metrics: Option<PlanMetrics>,
}

impl PlanResult {
    /// Total records committed across all entities.
    pub fn total_records(&self) -> u64 {
        [&self.users, &self.categories, &self.products]
            .into_iter()
            .flatten()
            .map(|summary| summary.committed)
            .sum()
    }
}

/// Performance metrics from a seeding plan.
#[derive(Debug, Clone)]
pub struct PlanMetrics {
    /// Time spent seeding (milliseconds).
    pub seeding_time_ms: u64,
    /// Number of records committed.
    pub total_records: u64,
    /// Number of commit cycles across all entities.
    pub total_batches: u64,
    /// Highest process memory observed at any flush.
    pub peak_memory_bytes: u64,
}

/// Builder for seeding users, categories and products.
///
/// # Example
///
/// ```rust,ignore
/// let result = FixturePlan::new()
///     .with_users(500)
///     .with_categories(12)
///     .with_products(20_000)
///     .with_batch_size(200)
///     .with_seed(12345)
///     .seed(&mut store)
///     .await?;
/// ```
pub struct FixturePlan {
    user_count: u64,
    user_config: UserGenConfig,

    category_count: u64,
    category_names: Option<Vec<String>>,

    product_count: u64,
    product_config: ProductGenConfig,

    batch_size: usize,
    seed: u64,
    base_time: OffsetDateTime,
    track_metrics: bool,
}

impl FixturePlan {
    /// Creates a plan with the default fixture sizes.
    pub fn new() -> Self {
        Self::from_config(&FixtureConfig::default())
    }

    /// Creates a plan from loader configuration.
    pub fn from_config(config: &FixtureConfig) -> Self {
        Self {
            user_count: config.user_count,
            user_config: UserGenConfig::default(),
            category_count: config.category_count,
            category_names: None,
            product_count: config.product_count,
            product_config: ProductGenConfig::default(),
            batch_size: config.batch_size,
            seed: config.rng_seed,
            base_time: OffsetDateTime::now_utc(),
            track_metrics: false,
        }
    }

    /// A handful of each entity, for quick manual checks.
    pub fn small() -> Self {
        Self::new()
            .with_users(20)
            .with_categories(5)
            .with_products(100)
            .with_batch_size(25)
    }

    /// A catalog large enough to load-test listing pages.
    pub fn load_test() -> Self {
        Self::new()
            .with_users(10_000)
            .with_categories(40)
            .with_products(250_000)
            .with_batch_size(500)
            .with_metrics(true)
    }

    pub fn with_users(mut self, count: u64) -> Self {
        self.user_count = count;
        self
    }

    pub fn with_user_config(mut self, config: UserGenConfig) -> Self {
        self.user_config = config;
        self
    }

    pub fn with_categories(mut self, count: u64) -> Self {
        self.category_count = count;
        self
    }

    /// Overrides the names used for the first categories.
    pub fn with_category_names(mut self, names: Vec<String>) -> Self {
        self.category_names = Some(names);
        self
    }

    pub fn with_products(mut self, count: u64) -> Self {
        self.product_count = count;
        self
    }

    pub fn with_product_config(mut self, config: ProductGenConfig) -> Self {
        self.product_config = config;
        self
    }

    /// Sets the number of records committed per batch.
    ///
    /// Entities with fewer records than this are committed in one batch.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the RNG seed (for reproducible data).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the reference time registration and creation dates count back from.
    pub fn with_base_time(mut self, base_time: OffsetDateTime) -> Self {
        self.base_time = base_time;
        self
    }

    /// Enables metrics tracking for performance analysis.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.track_metrics = enabled;
        self
    }

    /// Seeds every entity into `store` in dependency order.
    ///
    /// Categories are committed and released before products are generated;
    /// products then reference categories re-resolved from the store.
    pub async fn seed<S: SeedStore>(self, store: &mut S) -> Result<PlanResult, FixtureError> {
        let started = Instant::now();
        let base_time = self.base_time;

        let users = if self.user_count > 0 {
            let user_gen = UserGenerator::with_config(self.user_config.clone());
            let spec = SeedSpec::new(self.user_count, self.batch_for(self.user_count), |index, rng| {
                user_gen.generate(index, base_time, rng)
            })
            .with_seed(self.seed ^ USER_STREAM);

            Some(BoundedBatchSeeder::new().run(spec, store)?.finish().await?)
        } else {
            None
        };

        let mut category_ids: Vec<RecordId> = Vec::new();
        let categories = if self.category_count > 0 {
            let category_gen = match &self.category_names {
                Some(names) => CategoryGenerator::with_names(names.clone()),
                None => CategoryGenerator::new(),
            };
            let spec = SeedSpec::new(
                self.category_count,
                self.batch_for(self.category_count),
                |index, rng| {
                    let category = category_gen.generate(index, rng);
                    category_ids.push(category.id);
                    Ok(category)
                },
            )
            .with_seed(self.seed ^ CATEGORY_STREAM);

            Some(BoundedBatchSeeder::new().run(spec, store)?.finish().await?)
        } else {
            None
        };

        let products = if self.product_count > 0 {
            if category_ids.is_empty() {
                return Err(FixtureError::NoCategories);
            }
            let category_refs = resolve_categories(store, &category_ids).await?;

            let product_gen = ProductGenerator::with_config(self.product_config.clone());
            let spec = SeedSpec::new(
                self.product_count,
                self.batch_for(self.product_count),
                |index, rng| product_gen.generate(index, &category_refs, base_time, rng),
            )
            .with_seed(self.seed ^ PRODUCT_STREAM);

            Some(BoundedBatchSeeder::new().run(spec, store)?.finish().await?)
        } else {
            None
        };

        let metrics = self.track_metrics.then(|| {
            let summaries: Vec<&RunSummary> = [&users, &categories, &products]
                .into_iter()
                .flatten()
                .collect();
            PlanMetrics {
                seeding_time_ms: started.elapsed().as_millis() as u64,
                total_records: summaries.iter().map(|s| s.committed).sum(),
                total_batches: summaries.iter().map(|s| s.batches).sum(),
                peak_memory_bytes: summaries
                    .iter()
                    .map(|s| s.peak_memory_bytes)
                    .max()
                    .unwrap_or(0),
            }
        });

        let result = PlanResult {
            users,
            categories,
            products,
            metrics,
        };

        info!("Fixture plan seeded {} records", result.total_records());
        Ok(result)
    }

    fn batch_for(&self, count: u64) -> usize {
        self.batch_size.clamp(1, count.max(1) as usize)
    }
}

impl Default for FixturePlan {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-resolves committed categories, keeping only what products need.
async fn resolve_categories<S: SeedStore>(
    store: &mut S,
    ids: &[RecordId],
) -> Result<Vec<CategoryRef>, FixtureError> {
    let mut refs = Vec::with_capacity(ids.len());
    for &id in ids {
        let handle = store.reattach::<GeneratedCategory>(id).await?;
        refs.push(handle.with(|category| CategoryRef::from(category))?);
    }
    store.release();

    Ok(refs)
}
