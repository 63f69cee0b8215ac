//! End-to-end ingestion pipeline
//!
//! bytes → extract → collect → validate → bulk insert → stats.
//!
//! Row-level problems (validation rejections, rows the store refuses) are
//! reported as diagnostics and never abort the batch. Extraction problems
//! and batch-level store failures abort the whole request.

use thiserror::Error;
use tracing::info;

use super::archive::{extractor_for, ArchiveFormat, ExtractError};
use super::collect::{collect_csv_rows, CollectError};
use super::validate::validate_rows;
use crate::store::{IngestStats, PriceStore, StoreError};

/// Result of one ingestion invocation: the aggregate stats plus
/// human-readable diagnostics for every excluded row.
#[derive(Debug)]
pub struct IngestReport {
    pub stats: IngestStats,
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run the whole ingestion pipeline over one uploaded archive.
#[tracing::instrument(skip(store, bytes), fields(format = %format, size = bytes.len()))]
pub async fn ingest_archive(
    store: &dyn PriceStore,
    format: ArchiveFormat,
    bytes: &[u8],
) -> Result<IngestReport, PipelineError> {
    let tree = extractor_for(format).extract(bytes)?;
    let rows = collect_csv_rows(tree.path())?;

    let outcome = validate_rows(&rows);
    let mut diagnostics: Vec<String> = outcome.rejections.iter().map(ToString::to_string).collect();

    let inserted = store.bulk_insert(&outcome.records).await?;
    diagnostics.extend(inserted.skipped);

    info!(
        total_items = inserted.stats.total_items,
        excluded = diagnostics.len(),
        "archive ingested"
    );

    Ok(IngestReport {
        stats: inserted.stats,
        diagnostics,
    })
    // `tree` drops here; the extraction directory is removed on every path.
}
