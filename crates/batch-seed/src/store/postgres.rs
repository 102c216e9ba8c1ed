//! PostgreSQL store backed by a generic `seed_records` table.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use super::{RecordHandle, SeedStore, StoreError, UnitOfWork};
use crate::record::{RecordId, SeedRecord};

/// Rows per INSERT statement, kept well below the bind-parameter limit.
const ROWS_PER_STATEMENT: usize = 5_000;

/// Applies the embedded migrations that create `seed_records`.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Store that commits each batch in a single database transaction.
pub struct PgStore {
    pool: PgPool,
    uow: UnitOfWork,
}

impl PgStore {
    /// Creates a new store with the given database pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            uow: UnitOfWork::new(),
        }
    }

    /// Counts committed records of `kind`.
    pub async fn count(&self, kind: &str) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seed_records WHERE kind = $1")
            .bind(kind)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Deletes all committed records of the given kinds.
    ///
    /// **WARNING**: This deletes data. Use with caution.
    pub async fn purge(&self, kinds: &[&str]) -> Result<u64, StoreError> {
        info!("Purging seeded records: {}", kinds.join(", "));

        let result = sqlx::query("DELETE FROM seed_records WHERE kind = ANY($1)")
            .bind(kinds)
            .execute(&self.pool)
            .await?;

        info!("Purged {} records", result.rows_affected());
        Ok(result.rows_affected())
    }

    /// Returns a reference to the pool for advanced usage.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SeedStore for PgStore {
    fn stage<R: SeedRecord>(&mut self, record: R) -> Result<RecordHandle<R>, StoreError> {
        self.uow.stage(record)
    }

    async fn commit(&mut self) -> Result<usize, StoreError> {
        let staged = self.uow.take_staged();
        if staged.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::commit)?;

        for chunk in staged.chunks(ROWS_PER_STATEMENT) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO seed_records (kind, id, body) ");
            builder.push_values(chunk, |mut values, row| {
                values
                    .push_bind(row.kind)
                    .push_bind(row.id)
                    .push_bind(Json(&row.body));
            });

            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(StoreError::commit)?;
        }

        // Dropping the transaction on error rolls it back
        tx.commit().await.map_err(StoreError::commit)?;

        debug!("Committed {} rows to seed_records", staged.len());
        Ok(staged.len())
    }

    fn release(&mut self) {
        self.uow.clear();
    }

    async fn reattach<R: SeedRecord>(
        &mut self,
        id: RecordId,
    ) -> Result<RecordHandle<R>, StoreError> {
        if let Some(handle) = self.uow.lookup::<R>(id) {
            return Ok(handle);
        }

        let body: Option<Json<serde_json::Value>> =
            sqlx::query_scalar("SELECT body FROM seed_records WHERE kind = $1 AND id = $2")
                .bind(R::KIND)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Json(body) = body.ok_or(StoreError::NotFound { kind: R::KIND, id })?;
        let record: R = serde_json::from_value(body)?;
        Ok(self.uow.manage(record))
    }

    fn staged_len(&self) -> usize {
        self.uow.staged_len()
    }
}
