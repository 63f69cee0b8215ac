//! Export prices query
//!
//! Reads every stored row ordered by id, serializes the fixed-header CSV,
//! and packages it as `data.csv` inside a zip archive. Read-only: the store
//! is never mutated.

use std::io::{Cursor, Write};
use std::sync::Arc;

use crate::store::{PriceStore, StoreError, StoredPrice};

/// Fixed CSV header, in column order.
pub const CSV_HEADER: [&str; 5] = ["ID", "Name", "Category", "Price", "CreatedAt"];

/// Name of the single CSV entry inside the archive.
pub const ARCHIVE_ENTRY_NAME: &str = "data.csv";

/// Suggested download filename for the archive.
pub const ARCHIVE_FILENAME: &str = "prices.zip";

/// Query to export all stored prices as a zip-packaged CSV
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportPricesQuery;

#[derive(Debug, Clone)]
pub struct ExportPricesResponse {
    /// Zip archive bytes containing [`ARCHIVE_ENTRY_NAME`].
    pub content: Vec<u8>,
    pub content_type: &'static str,
    pub filename: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportPricesError {
    #[error("Failed to read prices: {0}")]
    Store(#[from] StoreError),
    #[error("Failed to serialize CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to build export archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error during export: {0}")]
    Io(#[from] std::io::Error),
}

#[tracing::instrument(skip(store, _query))]
pub async fn handle(
    store: Arc<dyn PriceStore>,
    _query: ExportPricesQuery,
) -> Result<ExportPricesResponse, ExportPricesError> {
    let prices = store.fetch_all().await?;

    let csv_bytes = serialize_csv(&prices)?;
    let content = build_archive(&csv_bytes)?;

    tracing::debug!(rows = prices.len(), bytes = content.len(), "export archive built");

    Ok(ExportPricesResponse {
        content,
        content_type: "application/zip",
        filename: ARCHIVE_FILENAME,
    })
}

/// Serialize stored rows to CSV: prices as fixed-point with two decimals,
/// dates as `YYYY-MM-DD` with the time-of-day discarded.
fn serialize_csv(prices: &[StoredPrice]) -> Result<Vec<u8>, ExportPricesError> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(CSV_HEADER)?;

        for price in prices {
            writer.write_record([
                price.id.to_string(),
                price.name.clone(),
                price.category.clone(),
                format!("{:.2}", price.price),
                price.created_at.format("%Y-%m-%d").to_string(),
            ])?;
        }

        writer.flush()?;
    }
    Ok(buf)
}

fn build_archive(csv_bytes: &[u8]) -> Result<Vec<u8>, ExportPricesError> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(ARCHIVE_ENTRY_NAME, zip::write::SimpleFileOptions::default())?;
    writer.write_all(csv_bytes)?;
    Ok(writer.finish()?.into_inner())
}
