//! Integration tests for the PostgreSQL store.
//!
//! To run these tests, you need a PostgreSQL database and the
//! DATABASE_URL environment variable set. Migrations are applied by the
//! tests themselves.
//!
//! Run with: `DATABASE_URL=postgres://... cargo nextest run -p batch-seed postgres`

use batch_seed::prelude::*;
use batch_seed::migrate;
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::env;
use uuid::Uuid;

/// Get database pool, skipping tests if DATABASE_URL is not set.
async fn get_test_pool() -> Option<PgPool> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };

    match PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            eprintln!("Skipping test: Failed to connect to database: {e}");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sensor {
    id: Uuid,
    serial: String,
    reading: f64,
}

impl SeedRecord for Sensor {
    const KIND: &'static str = "test_sensor";

    fn id(&self) -> RecordId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Gauge {
    id: Uuid,
    position: u64,
}

impl SeedRecord for Gauge {
    const KIND: &'static str = "test_gauge";

    fn id(&self) -> RecordId {
        self.id
    }
}

fn sensor(index: u64, rng: &mut StdRng) -> anyhow::Result<Sensor> {
    Ok(Sensor {
        id: record_id(rng),
        serial: format!("SN-{index:06}"),
        reading: rng.gen_range(-40.0..85.0),
    })
}

#[tokio::test]
async fn test_seed_and_reattach_through_postgres() {
    let Some(pool) = get_test_pool().await else {
        return;
    };
    migrate(&pool).await.expect("migrations");

    let mut store = PgStore::new(pool.clone());
    store.purge(&[Sensor::KIND]).await.unwrap();

    let spec = SeedSpec::new(1005, 100, sensor).with_seed(42);
    let mut run = BoundedBatchSeeder::new().run(spec, &mut store).unwrap();

    let first = run.next_batch().await.unwrap().unwrap();
    assert_eq!(first.cumulative, 100);

    let summary = run.finish().await.unwrap();
    assert_eq!(summary.committed, 1005);
    assert_eq!(summary.batches, 10);

    assert_eq!(store.count(Sensor::KIND).await.unwrap(), 1005);

    let id: Uuid =
        sqlx::query_scalar("SELECT id FROM seed_records WHERE kind = $1 ORDER BY id LIMIT 1")
            .bind(Sensor::KIND)
            .fetch_one(&pool)
            .await
            .unwrap();
    let handle = store.reattach::<Sensor>(id).await.unwrap();
    let kept = handle.cloned().unwrap();
    assert!(kept.serial.starts_with("SN-"));

    store.release();
    assert!(matches!(handle.cloned(), Err(StoreError::Detached { .. })));

    let missing = store.reattach::<Sensor>(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(missing, StoreError::NotFound { .. }));

    assert_eq!(store.purge(&[Sensor::KIND]).await.unwrap(), 1005);
}

#[tokio::test]
async fn test_failed_commit_rolls_back_batch() {
    let Some(pool) = get_test_pool().await else {
        return;
    };
    migrate(&pool).await.expect("migrations");

    let mut store = PgStore::new(pool);
    store.purge(&[Gauge::KIND]).await.unwrap();

    let clash = Uuid::new_v4();
    store
        .stage(Gauge {
            id: clash,
            position: 0,
        })
        .unwrap();
    store.commit().await.unwrap();
    store.release();

    // Batch 2 reuses the committed id at position 15
    let spec = SeedSpec::new(30, 10, move |index, _rng: &mut StdRng| {
        let id = if index == 15 { clash } else { Uuid::new_v4() };
        Ok(Gauge {
            id,
            position: index,
        })
    });

    let err = BoundedBatchSeeder::new()
        .run(spec, &mut store)
        .unwrap()
        .finish()
        .await
        .unwrap_err();

    assert_eq!(err.committed(), Some(10));
    // First batch plus the pre-existing row; nothing from batch 2
    assert_eq!(store.count(Gauge::KIND).await.unwrap(), 11);

    store.purge(&[Gauge::KIND]).await.unwrap();
}
