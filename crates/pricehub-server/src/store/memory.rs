//! In-memory implementation of the price store
//!
//! Mirrors the observable semantics of [`super::PgPriceStore`], including
//! the schema's row-level constraints, so the pipeline can be exercised
//! without a database. Used by the test suite and handy for local runs.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use super::{BulkInsertOutcome, IngestStats, PriceRecord, PriceStore, StoreError, StoredPrice};

/// Schema limit on `name` (VARCHAR(255)).
const MAX_NAME_LEN: usize = 255;
/// Schema limit on `category` (VARCHAR(100)).
const MAX_CATEGORY_LEN: usize = 100;

#[derive(Default)]
pub struct MemoryPriceStore {
    inner: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    rows: Vec<StoredPrice>,
}

impl MemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("price store lock poisoned".to_string()))
    }

    /// Row constraints matching the `prices` table definition.
    fn check_row(record: &PriceRecord) -> Result<(), String> {
        if record.name.len() > MAX_NAME_LEN {
            return Err(format!("value too long for column \"name\" ({} chars)", record.name.len()));
        }
        if record.category.len() > MAX_CATEGORY_LEN {
            return Err(format!(
                "value too long for column \"category\" ({} chars)",
                record.category.len()
            ));
        }
        if !record.price.is_finite() || record.price < 0.0 {
            return Err("new row violates check constraint on \"price\"".to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn bulk_insert(&self, records: &[PriceRecord]) -> Result<BulkInsertOutcome, StoreError> {
        let mut state = self.lock()?;

        let mut inserted: i64 = 0;
        let mut skipped = Vec::new();

        for record in records {
            if let Err(reason) = Self::check_row(record) {
                tracing::warn!(
                    source_id = record.source_id,
                    name = %record.name,
                    reason = %reason,
                    "store rejected row, skipping"
                );
                skipped.push(format!("record {}: {}", record.source_id, reason));
                continue;
            }

            state.next_id += 1;
            let id = state.next_id;
            state.rows.push(StoredPrice {
                id,
                name: record.name.clone(),
                category: record.category.clone(),
                price: record.price,
                created_at: record.created_at,
            });
            inserted += 1;
        }

        let categories: HashSet<&str> = state.rows.iter().map(|r| r.category.as_str()).collect();
        let total_price: f64 = state.rows.iter().map(|r| r.price).sum();

        Ok(BulkInsertOutcome {
            stats: IngestStats {
                total_items: inserted,
                total_categories: categories.len() as i64,
                total_price,
            },
            skipped,
        })
    }

    async fn fetch_all(&self) -> Result<Vec<StoredPrice>, StoreError> {
        let state = self.lock()?;
        Ok(state.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(name: &str, category: &str, price: f64) -> PriceRecord {
        PriceRecord {
            source_id: 1,
            name: name.to_string(),
            category: category.to_string(),
            price,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_bulk_insert_reports_batch_and_store_wide_stats() {
        let store = MemoryPriceStore::new();

        let outcome = store
            .bulk_insert(&[record("Widget", "Hardware", 9.99), record("Bolt", "Hardware", 0.50)])
            .await
            .unwrap();
        assert_eq!(outcome.stats.total_items, 2);
        assert_eq!(outcome.stats.total_categories, 1);
        assert!((outcome.stats.total_price - 10.49).abs() < 1e-9);

        // A second batch: total_items is per-call, the rest store-wide.
        let outcome = store
            .bulk_insert(&[record("Manual", "Books", 4.00)])
            .await
            .unwrap();
        assert_eq!(outcome.stats.total_items, 1);
        assert_eq!(outcome.stats.total_categories, 2);
        assert!((outcome.stats.total_price - 14.49).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_bulk_insert_skips_constraint_violations() {
        let store = MemoryPriceStore::new();

        let long_name = "x".repeat(MAX_NAME_LEN + 1);
        let outcome = store
            .bulk_insert(&[record(&long_name, "Hardware", 1.0), record("Widget", "Hardware", 2.0)])
            .await
            .unwrap();

        assert_eq!(outcome.stats.total_items, 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(outcome.skipped[0].contains("name"));

        let rows = store.fetch_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Widget");
    }

    #[tokio::test]
    async fn test_ids_are_store_assigned_and_ascending() {
        let store = MemoryPriceStore::new();
        store
            .bulk_insert(&[record("A", "", 1.0), record("B", "", 2.0)])
            .await
            .unwrap();

        let rows = store.fetch_all().await.unwrap();
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].id, 2);
    }
}
