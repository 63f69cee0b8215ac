//! Write operations for the prices feature

pub mod ingest_archive;

pub use ingest_archive::{
    IngestPricesCommand, IngestPricesError, IngestPricesResponse, DEFAULT_ARCHIVE_TYPE,
};
