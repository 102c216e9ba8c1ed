//! Default seed script - loads the fixture catalog
//!
//! Run with:
//! ```
//! DATABASE_URL=postgres://... SEED_PRODUCTS=100000 cargo run -p fixtures --bin seed
//! ```
//!
//! Without `DATABASE_URL` the plan runs against an in-memory store.

use batch_seed::{MemoryStore, PgStore, migrate};
use fixtures::FIXTURE_KINDS;
use fixtures::builders::{FixturePlan, PlanResult};
use fixtures::config::FixtureConfig;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = FixtureConfig::from_env()?;
    let plan = FixturePlan::from_config(&config).with_metrics(true);

    let result = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;

            tracing::info!("Connected to database");
            migrate(&pool).await?;

            let mut store = PgStore::new(pool);
            if config.purge {
                store.purge(&FIXTURE_KINDS).await?;
            }
            plan.seed(&mut store).await?
        }
        None => {
            tracing::warn!("DATABASE_URL not set, seeding an in-memory store (dry run)");
            let mut store = MemoryStore::new();
            plan.seed(&mut store).await?
        }
    };

    report(&result);
    Ok(())
}

fn report(result: &PlanResult) {
    tracing::info!("Seed completed!");
    for summary in [&result.users, &result.categories, &result.products]
        .into_iter()
        .flatten()
    {
        tracing::info!(
            "  {}: {} records in {} batches",
            summary.kind,
            summary.committed,
            summary.batches
        );
    }

    if let Some(metrics) = &result.metrics {
        tracing::info!("  Seeding time: {} ms", metrics.seeding_time_ms);
        tracing::info!(
            "  Peak memory: {:.1} MB",
            metrics.peak_memory_bytes as f64 / 1024.0 / 1024.0
        );
    }
}
