//! Row validation
//!
//! Turns raw CSV rows into [`PriceRecord`]s or rejection reasons. Rules are
//! applied in a fixed order and the first failing rule names the reason.
//! Rejections accumulate as diagnostics; they never abort the batch.

use chrono::{NaiveDate, NaiveTime, Utc};
use thiserror::Error;
use tracing::debug;

use super::collect::RawRow;
use crate::store::PriceRecord;

/// Expected layout of a data row: id, name, category, price, date.
const MIN_FIELDS: usize = 5;

/// Accepted date layout for field 4.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Why a row was excluded from persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("insufficient fields")]
    InsufficientFields,

    #[error("invalid id")]
    InvalidId,

    #[error("empty name")]
    EmptyName,

    #[error("invalid price")]
    InvalidPrice,

    #[error("negative price")]
    NegativePrice,

    #[error("invalid date format")]
    InvalidDateFormat,
}

/// A rejected row with its provenance, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub file: String,
    pub line: usize,
    pub reason: RejectReason,
}

impl std::fmt::Display for RowRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} line {}: {}", self.file, self.line, self.reason)
    }
}

/// Outcome of validating a batch of raw rows.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub records: Vec<PriceRecord>,
    pub rejections: Vec<RowRejection>,
}

/// Validate one raw row.
///
/// Rules, first failure wins:
/// 1. at least [`MIN_FIELDS`] fields
/// 2. field 0 parses as an integer (advisory source id, never persisted)
/// 3. field 1, trimmed, is non-empty
/// 4. field 3 parses as a non-negative finite decimal
/// 5. field 4, if non-empty after trimming, matches `YYYY-MM-DD`; when empty
///    the record is stamped with the current instant
///
/// Field 2 (category) is trimmed and accepted even when empty.
pub fn validate_row(row: &RawRow) -> Result<PriceRecord, RejectReason> {
    if row.fields.len() < MIN_FIELDS {
        return Err(RejectReason::InsufficientFields);
    }

    let source_id: i64 = row.fields[0].parse().map_err(|_| RejectReason::InvalidId)?;

    let name = row.fields[1].trim();
    if name.is_empty() {
        return Err(RejectReason::EmptyName);
    }

    let category = row.fields[2].trim();

    let price: f64 = row.fields[3].parse().map_err(|_| RejectReason::InvalidPrice)?;
    if !price.is_finite() {
        return Err(RejectReason::InvalidPrice);
    }
    if price < 0.0 {
        return Err(RejectReason::NegativePrice);
    }

    let date_field = row.fields[4].trim();
    let created_at = if date_field.is_empty() {
        Utc::now()
    } else {
        let date = NaiveDate::parse_from_str(date_field, DATE_FORMAT)
            .map_err(|_| RejectReason::InvalidDateFormat)?;
        // Midnight UTC; the export path discards time-of-day anyway.
        date.and_time(NaiveTime::MIN).and_utc()
    };

    Ok(PriceRecord {
        source_id,
        name: name.to_string(),
        category: category.to_string(),
        price,
        created_at,
    })
}

/// Validate a batch, splitting it into records and rejection diagnostics.
pub fn validate_rows(rows: &[RawRow]) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    for row in rows {
        match validate_row(row) {
            Ok(record) => outcome.records.push(record),
            Err(reason) => {
                debug!(file = %row.file, line = row.line, %reason, "row rejected");
                outcome.rejections.push(RowRejection {
                    file: row.file.clone(),
                    line: row.line,
                    reason,
                });
            }
        }
    }

    outcome
}
