//! Recursive CSV discovery
//!
//! Walks an extracted tree and reads every `.csv` file into raw rows. The
//! first row of each file is dropped as a header whether or not one is
//! present, and rows the CSV parser cannot decode are skipped without
//! aborting the file or the walk.
//!
//! Ordering: rows keep their per-file order; the order *across* files
//! follows directory traversal order and is not stable across filesystems.

use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// An unvalidated row: the ordered string fields of one CSV line plus where
/// it came from, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Source file, relative to the extraction root.
    pub file: String,
    /// 1-based line index within the file (the discarded header is line 1).
    pub line: usize,
    pub fields: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to read extracted files: {0}")]
    Io(#[from] std::io::Error),
}

/// Collect raw rows from every `.csv` file under `root`, recursively.
pub fn collect_csv_rows(root: &Path) -> Result<Vec<RawRow>, CollectError> {
    let mut rows = Vec::new();
    walk(root, root, &mut rows)?;
    debug!(rows = rows.len(), "collected raw CSV rows");
    Ok(rows)
}

fn walk(root: &Path, dir: &Path, rows: &mut Vec<RawRow>) -> Result<(), CollectError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(root, &path, rows)?;
        } else if has_csv_extension(&path) {
            read_csv_file(root, &path, rows)?;
        }
    }
    Ok(())
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn read_csv_file(root: &Path, path: &Path, rows: &mut Vec<RawRow>) -> Result<(), CollectError> {
    let file = File::open(path)?;
    let rel_path = path
        .strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string();

    // has_headers is off so the header discard stays explicit; flexible lets
    // short rows through to the validator, which owns the field-count rule.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut malformed = 0usize;
    for (index, result) in reader.records().enumerate() {
        if index == 0 {
            // First row of every file is treated as a header and dropped.
            continue;
        }
        match result {
            Ok(record) => rows.push(RawRow {
                file: rel_path.clone(),
                line: index + 1,
                fields: record.iter().map(str::to_string).collect(),
            }),
            Err(e) => {
                malformed += 1;
                debug!(file = %rel_path, line = index + 1, error = %e, "skipping malformed CSV row");
            }
        }
    }

    if malformed > 0 {
        warn!(file = %rel_path, malformed, "malformed CSV rows skipped");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_header_row_is_always_discarded() {
        let dir = tempfile::tempdir().unwrap();
        // No header present; the first data row is still dropped.
        write_file(dir.path(), "data.csv", "1,Widget,Hardware,9.99,2024-01-15\n2,Bolt,Hardware,0.50,\n");

        let rows = collect_csv_rows(dir.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields[1], "Bolt");
        assert_eq!(rows[0].line, 2);
    }

    #[test]
    fn test_recursive_walk_and_non_csv_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "top.csv", "h\na\n");
        write_file(dir.path(), "sub/inner.CSV", "h\nb\n");
        write_file(dir.path(), "sub/readme.txt", "not,a,csv\nrow\n");

        let rows = collect_csv_rows(dir.path()).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.fields[0].as_str()).collect();
        // Cross-file order is traversal-dependent; assert membership only.
        assert_eq!(rows.len(), 2);
        assert!(names.contains(&"a"));
        assert!(names.contains(&"b"));
    }

    #[test]
    fn test_undecodable_rows_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = b"id,name\n1,ok\n2,".to_vec();
        content.extend_from_slice(&[0xff, 0xfe]); // not valid UTF-8
        content.extend_from_slice(b"\n3,also ok\n");
        fs::write(dir.path().join("data.csv"), content).unwrap();

        let rows = collect_csv_rows(dir.path()).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.fields[1].as_str()).collect();
        assert_eq!(names, vec!["ok", "also ok"]);
    }

    #[test]
    fn test_per_file_order_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "data.csv", "h\nfirst\nsecond\nthird\n");

        let rows = collect_csv_rows(dir.path()).unwrap();
        let fields: Vec<&str> = rows.iter().map(|r| r.fields[0].as_str()).collect();
        assert_eq!(fields, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_tree_yields_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_csv_rows(dir.path()).unwrap().is_empty());
    }
}
