//! Storage capability for price data
//!
//! The pipeline never talks to the database directly; it receives a
//! [`PriceStore`] handle. The production implementation is
//! [`PgPriceStore`]; [`MemoryPriceStore`] provides the same observable
//! semantics for tests and local experiments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryPriceStore;
pub use postgres::PgPriceStore;

/// A price row that passed validation and is ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    /// Identifier carried by the source file. Advisory only: it is used for
    /// logging and diagnostics, never as the persisted key.
    pub source_id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

/// A row as persisted by the store. Append-only: the pipeline never mutates
/// a stored row after insertion.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredPrice {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

/// Aggregate statistics reported after a bulk insert.
///
/// `total_items` counts rows inserted by the reporting call only;
/// `total_categories` and `total_price` are store-wide and are recomputed
/// from current store state inside the insert transaction, never maintained
/// incrementally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestStats {
    pub total_items: i64,
    pub total_categories: i64,
    pub total_price: f64,
}

/// Result of a bulk insert: the aggregate stats plus descriptions of rows
/// the store itself rejected (and which the batch tolerated).
#[derive(Debug, Clone)]
pub struct BulkInsertOutcome {
    pub stats: IngestStats,
    pub skipped: Vec<String>,
}

/// Storage-level failures. These are always server errors: by the time the
/// store is involved, caller input has already been validated.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Storage capability injected into the ingestion/export pipeline.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Insert a batch of validated records as one atomic unit.
    ///
    /// Individual rows the store rejects are skipped and reported in the
    /// outcome; a failure of the batch machinery itself (begin, aggregate
    /// read, commit) persists nothing and surfaces as an error.
    async fn bulk_insert(&self, records: &[PriceRecord]) -> Result<BulkInsertOutcome, StoreError>;

    /// All stored rows, ordered by ascending id.
    async fn fetch_all(&self) -> Result<Vec<StoredPrice>, StoreError>;
}
