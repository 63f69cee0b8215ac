//! Prices feature slice
//!
//! Vertical slice covering price data: the bulk-ingest command (archive
//! upload) and the export query (zip-packaged CSV download).

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::prices_routes;
