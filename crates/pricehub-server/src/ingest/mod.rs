//! Bulk ingestion pipeline
//!
//! Stages, leaf-first:
//!
//! - [`archive`] — decode a zip or tar(.gz) byte stream into an ephemeral
//!   directory tree, sandboxed against path escapes
//! - [`collect`] — walk the tree and read every `.csv` file into raw rows
//! - [`validate`] — turn raw rows into validated records or rejections
//! - [`pipeline`] — wire the stages together against a [`crate::store::PriceStore`]

pub mod archive;
pub mod collect;
pub mod pipeline;
pub mod validate;

pub use archive::{ArchiveFormat, ExtractError};
pub use pipeline::{ingest_archive, IngestReport, PipelineError};
