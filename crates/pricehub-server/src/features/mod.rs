//! Feature modules implementing the pricehub API
//!
//! Each feature is a vertical slice with its own commands, queries, and
//! routes:
//!
//! - **prices**: bulk ingestion of price archives and CSV export
//!
//! Commands are write operations, queries are read operations; route
//! handlers build a command/query value and dispatch to its `handle`
//! function directly.

pub mod prices;

use axum::Router;
use std::sync::Arc;

use crate::store::PriceStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Storage capability handed to every command and query.
    pub store: Arc<dyn PriceStore>,
}

/// Creates the API router with all feature routes mounted
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .merge(prices::prices_routes())
        .with_state(state)
}
