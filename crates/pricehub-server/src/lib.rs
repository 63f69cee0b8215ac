//! Pricehub Server Library
//!
//! HTTP server for bulk price-data ingestion and export.
//!
//! # Overview
//!
//! - **Ingestion**: `POST /api/v0/prices` accepts a zip or tar(.gz) archive of
//!   CSV files; rows are validated and inserted in one transaction, and the
//!   response carries store-wide aggregate stats plus per-row diagnostics.
//! - **Export**: `GET /api/v0/prices` streams back every stored row as a
//!   zip-packaged CSV.
//!
//! # Architecture
//!
//! Features are vertical slices (commands for writes, queries for reads)
//! dispatched directly from their routes. The pipeline itself never touches
//! the database: it is handed a [`store::PriceStore`] capability, with a
//! PostgreSQL implementation for production and an in-memory one for tests.
//!
//! ## Framework Stack
//!
//! - **Axum**: web framework
//! - **SQLx**: PostgreSQL driver and migrations
//! - **Tower / tower-http**: middleware (tracing, CORS, compression, static files)

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod store;
