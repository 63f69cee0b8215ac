//! Read operations for the prices feature

pub mod export_archive;

pub use export_archive::{ExportPricesError, ExportPricesQuery, ExportPricesResponse};
