//! PostgreSQL implementation of the price store
//!
//! `bulk_insert` runs as a single transaction at READ COMMITTED isolation:
//! the aggregate read at the end sees this batch plus everything committed
//! before it. Per-row failures are tolerated via savepoints; batch-level
//! failures roll the whole transaction back.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use super::{BulkInsertOutcome, IngestStats, PriceRecord, PriceStore, StoreError, StoredPrice};

pub struct PgPriceStore {
    pool: PgPool,
}

impl PgPriceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceStore for PgPriceStore {
    #[tracing::instrument(skip(self, records), fields(batch_size = records.len()))]
    async fn bulk_insert(&self, records: &[PriceRecord]) -> Result<BulkInsertOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let mut inserted: i64 = 0;
        let mut skipped = Vec::new();

        for record in records {
            // A failed statement poisons the enclosing transaction until it
            // is rolled back, so every row gets its own savepoint.
            sqlx::query("SAVEPOINT price_row").execute(&mut *tx).await?;

            let result = sqlx::query(
                "INSERT INTO prices (name, category, price, created_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(&record.name)
            .bind(&record.category)
            .bind(record.price)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => {
                    sqlx::query("RELEASE SAVEPOINT price_row")
                        .execute(&mut *tx)
                        .await?;
                    inserted += 1;
                }
                Err(e) => {
                    warn!(
                        source_id = record.source_id,
                        name = %record.name,
                        error = %e,
                        "store rejected row, skipping"
                    );
                    sqlx::query("ROLLBACK TO SAVEPOINT price_row")
                        .execute(&mut *tx)
                        .await?;
                    skipped.push(format!("record {}: {}", record.source_id, e));
                }
            }
        }

        // Read the store-wide aggregates from the same transaction so they
        // reflect exactly this batch plus all previously committed data.
        let (total_categories, total_price): (i64, f64) = sqlx::query_as(
            "SELECT COUNT(DISTINCT category), COALESCE(SUM(price), 0)::FLOAT8 FROM prices",
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(inserted, skipped = skipped.len(), "bulk insert committed");

        Ok(BulkInsertOutcome {
            stats: IngestStats {
                total_items: inserted,
                total_categories,
                total_price,
            },
            skipped,
        })
    }

    async fn fetch_all(&self) -> Result<Vec<StoredPrice>, StoreError> {
        let rows = sqlx::query_as::<_, StoredPrice>(
            "SELECT id, name, COALESCE(category, '') AS category, \
             price::FLOAT8 AS price, created_at \
             FROM prices ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
