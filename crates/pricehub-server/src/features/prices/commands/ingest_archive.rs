//! Ingest prices command
//!
//! Accepts raw archive bytes plus an archive-type selector, runs the bulk
//! ingestion pipeline, and reports the aggregate stats together with
//! diagnostics for every excluded row.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ingest::{self, ArchiveFormat, ExtractError, PipelineError};
use crate::store::{PriceStore, StoreError};

/// Archive type applied when the request does not name one.
pub const DEFAULT_ARCHIVE_TYPE: &str = "zip";

/// Command to ingest an uploaded price archive
#[derive(Debug, Clone)]
pub struct IngestPricesCommand {
    /// Raw value of the `type` selector (`zip` or `tar`).
    pub archive_type: String,
    /// Raw archive bytes.
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPricesResponse {
    pub total_items: i64,
    pub total_categories: i64,
    pub total_price: f64,
    /// One entry per excluded row (validation rejection or store refusal).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestPricesError {
    #[error("Archive content is required and cannot be empty")]
    ContentRequired,
    #[error("Failed to extract archive: {0}")]
    Extract(#[from] ExtractError),
    #[error("Failed to read CSV files: {0}")]
    Collect(#[from] ingest::collect::CollectError),
    #[error("Failed to insert prices: {0}")]
    Store(#[from] StoreError),
}

impl From<PipelineError> for IngestPricesError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Extract(e) => Self::Extract(e),
            PipelineError::Collect(e) => Self::Collect(e),
            PipelineError::Store(e) => Self::Store(e),
        }
    }
}

impl IngestPricesCommand {
    pub fn validate(&self) -> Result<(), IngestPricesError> {
        if self.content.is_empty() {
            return Err(IngestPricesError::ContentRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(store, command), fields(archive_type = %command.archive_type, size = command.content.len()))]
pub async fn handle(
    store: Arc<dyn PriceStore>,
    command: IngestPricesCommand,
) -> Result<IngestPricesResponse, IngestPricesError> {
    command.validate()?;

    let format: ArchiveFormat = command.archive_type.parse()?;
    let report = ingest::ingest_archive(store.as_ref(), format, &command.content).await?;

    Ok(IngestPricesResponse {
        total_items: report.stats.total_items,
        total_categories: report.stats.total_categories,
        total_price: report.stats.total_price,
        diagnostics: report.diagnostics,
    })
}
