//! HTTP routes for the prices feature

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use super::commands::{ingest_archive, IngestPricesCommand, IngestPricesError, DEFAULT_ARCHIVE_TYPE};
use super::queries::{export_archive, ExportPricesError, ExportPricesQuery};
use crate::api::response::ErrorResponse;
use crate::features::FeatureState;
use crate::ingest::ExtractError;

/// Upper bound on uploaded archive bytes. Large datasets exist, but this is
/// not a streaming pipeline; the whole archive is buffered.
const MAX_ARCHIVE_BYTES: usize = 100 * 1024 * 1024;

pub fn prices_routes() -> Router<FeatureState> {
    Router::new()
        .route("/prices", post(ingest_prices).get(export_prices))
        .layer(DefaultBodyLimit::max(MAX_ARCHIVE_BYTES))
}

#[derive(Debug, Deserialize)]
struct IngestParams {
    /// Archive container format; defaults to zip.
    #[serde(rename = "type")]
    archive_type: Option<String>,
}

#[tracing::instrument(skip(state, params, body), fields(size = body.len()))]
async fn ingest_prices(
    State(state): State<FeatureState>,
    Query(params): Query<IngestParams>,
    body: Bytes,
) -> Result<Response, PriceApiError> {
    let command = IngestPricesCommand {
        archive_type: params
            .archive_type
            .unwrap_or_else(|| DEFAULT_ARCHIVE_TYPE.to_string()),
        content: body.to_vec(),
    };

    let response = ingest_archive::handle(state.store.clone(), command).await?;

    tracing::info!(
        total_items = response.total_items,
        total_categories = response.total_categories,
        "prices ingested via API"
    );

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[tracing::instrument(skip(state))]
async fn export_prices(State(state): State<FeatureState>) -> Result<Response, PriceApiError> {
    let response = export_archive::handle(state.store.clone(), ExportPricesQuery).await?;

    let disposition = format!("attachment; filename=\"{}\"", response.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, response.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        response.content,
    )
        .into_response())
}

#[derive(Debug)]
enum PriceApiError {
    Ingest(IngestPricesError),
    Export(ExportPricesError),
}

impl From<IngestPricesError> for PriceApiError {
    fn from(err: IngestPricesError) -> Self {
        Self::Ingest(err)
    }
}

impl From<ExportPricesError> for PriceApiError {
    fn from(err: ExportPricesError) -> Self {
        Self::Export(err)
    }
}

impl IntoResponse for PriceApiError {
    fn into_response(self) -> Response {
        match self {
            // Caller-input problems: bad selector, corrupt bytes, entries
            // escaping the sandbox, unreadable extracted contents.
            PriceApiError::Ingest(IngestPricesError::ContentRequired)
            | PriceApiError::Ingest(IngestPricesError::Extract(ExtractError::UnsupportedFormat(_))) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            PriceApiError::Ingest(IngestPricesError::Extract(_))
            | PriceApiError::Ingest(IngestPricesError::Collect(_)) => {
                let error = ErrorResponse::new("ARCHIVE_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }

            PriceApiError::Ingest(IngestPricesError::Store(_)) => {
                tracing::error!("store error during ingestion: {}", self);
                let error = ErrorResponse::new("STORE_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            }

            PriceApiError::Export(_) => {
                tracing::error!("export failed: {}", self);
                let error = ErrorResponse::new("EXPORT_ERROR", "Failed to export prices");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            }
        }
    }
}

impl std::fmt::Display for PriceApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ingest(e) => write!(f, "{}", e),
            Self::Export(e) => write!(f, "{}", e),
        }
    }
}
