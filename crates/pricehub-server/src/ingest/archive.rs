//! Archive extraction
//!
//! Decodes an uploaded zip or tar(.gz) byte stream into an ephemeral
//! directory tree. Extraction is sandboxed: an entry whose resolved path
//! would land outside the destination directory aborts the whole operation.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;

/// Magic bytes identifying a gzip stream.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Supported upload container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
}

impl std::str::FromStr for ArchiveFormat {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar" => Ok(ArchiveFormat::Tar),
            other => Err(ExtractError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveFormat::Zip => write!(f, "zip"),
            ArchiveFormat::Tar => write!(f, "tar"),
        }
    }
}

/// Extraction failures. All of these abort the whole extraction; a partially
/// written tree is discarded when the [`ExtractedTree`] is dropped.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported archive type: {0}")]
    UnsupportedFormat(String),

    #[error("corrupt archive: {0}")]
    Corrupt(String),

    #[error("archive entry '{0}' escapes the extraction directory")]
    PathEscape(String),

    #[error("IO error during extraction: {0}")]
    Io(#[from] io::Error),
}

/// Extracted archive contents rooted in a fresh temporary directory.
///
/// The directory is removed when the value is dropped, on success and error
/// paths alike.
pub struct ExtractedTree {
    dir: TempDir,
}

impl ExtractedTree {
    fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("pricehub-extract-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Archive decoding capability. One implementation per container format.
pub trait ArchiveExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedTree, ExtractError>;
}

/// The extractor matching a parsed [`ArchiveFormat`].
pub fn extractor_for(format: ArchiveFormat) -> &'static dyn ArchiveExtractor {
    match format {
        ArchiveFormat::Zip => &ZipExtractor,
        ArchiveFormat::Tar => &TarExtractor,
    }
}

pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedTree, ExtractError> {
        let tree = ExtractedTree::create()?;
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractError::Corrupt(e.to_string()))?;

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| ExtractError::Corrupt(e.to_string()))?;

            // enclosed_name() yields None for `..` segments and absolute paths.
            let relative = entry
                .enclosed_name()
                .ok_or_else(|| ExtractError::PathEscape(entry.name().to_string()))?;
            let dest = tree.path().join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&dest)?;
                continue;
            }

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&dest)?;
            io::copy(&mut entry, &mut out)?;
        }

        debug!(entries = archive.len(), root = %tree.path().display(), "zip archive extracted");
        Ok(tree)
    }
}

pub struct TarExtractor;

impl ArchiveExtractor for TarExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedTree, ExtractError> {
        // Uploads arrive as raw bytes without a filename, so compressed input
        // is recognized by the gzip magic rather than a `.gz` suffix.
        if bytes.starts_with(&GZIP_MAGIC) {
            extract_tar_entries(GzDecoder::new(bytes))
        } else {
            extract_tar_entries(bytes)
        }
    }
}

fn extract_tar_entries<R: Read>(reader: R) -> Result<ExtractedTree, ExtractError> {
    let tree = ExtractedTree::create()?;
    let mut archive = tar::Archive::new(reader);

    let mut entries = 0usize;
    for entry in archive
        .entries()
        .map_err(|e| ExtractError::Corrupt(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| ExtractError::Corrupt(e.to_string()))?;
        let raw = entry
            .path()
            .map_err(|e| ExtractError::Corrupt(e.to_string()))?
            .into_owned();
        let dest = tree.path().join(sandboxed_entry_path(&raw)?);

        match entry.header().entry_type() {
            tar::EntryType::Directory => fs::create_dir_all(&dest)?,
            tar::EntryType::Regular => {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = File::create(&dest)?;
                io::copy(&mut entry, &mut out)?;
            }
            // Links and special entries are not materialized.
            _ => continue,
        }
        entries += 1;
    }

    debug!(entries, root = %tree.path().display(), "tar archive extracted");
    Ok(tree)
}

/// Rejects entry paths that would resolve outside the extraction root.
fn sandboxed_entry_path(path: &Path) -> Result<PathBuf, ExtractError> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return Err(ExtractError::PathEscape(path.display().to_string())),
        }
    }
    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn tar_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap()
    }

    /// Build a tar archive whose single entry name is written straight into
    /// the header, bypassing `append_data`'s path validation. Needed to forge
    /// a `..` entry the safe builder API refuses to emit, so the extractor's
    /// own sandbox check is what's under test.
    fn tar_bytes_raw_name(name: &str, content: &str) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        let name_bytes = name.as_bytes();
        header.as_gnu_mut().unwrap().name[..name_bytes.len()].copy_from_slice(name_bytes);
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, content.as_bytes()).unwrap();
        builder.into_inner().unwrap()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert_eq!("TAR".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Tar);
        assert!(matches!(
            "rar".parse::<ArchiveFormat>(),
            Err(ExtractError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_zip_extracts_nested_entries() {
        let bytes = zip_bytes(&[("data.csv", "a,b\n"), ("nested/more.csv", "c,d\n")]);
        let tree = ZipExtractor.extract(&bytes).unwrap();

        assert_eq!(fs::read_to_string(tree.path().join("data.csv")).unwrap(), "a,b\n");
        assert_eq!(
            fs::read_to_string(tree.path().join("nested/more.csv")).unwrap(),
            "c,d\n"
        );
    }

    #[test]
    fn test_tar_extracts_entries() {
        let bytes = tar_bytes(&[("data.csv", "a,b\n")]);
        let tree = TarExtractor.extract(&bytes).unwrap();
        assert_eq!(fs::read_to_string(tree.path().join("data.csv")).unwrap(), "a,b\n");
    }

    #[test]
    fn test_tar_gz_is_transparently_decompressed() {
        let bytes = gzip(&tar_bytes(&[("deep/dir/data.csv", "x,y\n")]));
        let tree = TarExtractor.extract(&bytes).unwrap();
        assert_eq!(
            fs::read_to_string(tree.path().join("deep/dir/data.csv")).unwrap(),
            "x,y\n"
        );
    }

    #[test]
    fn test_zip_rejects_path_escape() {
        let bytes = zip_bytes(&[("../../etc/passwd", "oops")]);
        assert!(matches!(
            ZipExtractor.extract(&bytes),
            Err(ExtractError::PathEscape(_))
        ));
    }

    #[test]
    fn test_tar_rejects_path_escape() {
        let bytes = tar_bytes_raw_name("../escape-tar-entry.txt", "oops");
        assert!(matches!(
            TarExtractor.extract(&bytes),
            Err(ExtractError::PathEscape(_))
        ));
        // Nothing may be written outside the sandbox root.
        assert!(!std::env::temp_dir().join("escape-tar-entry.txt").exists());
    }

    #[test]
    fn test_corrupt_input_is_rejected() {
        assert!(matches!(
            ZipExtractor.extract(b"definitely not a zip"),
            Err(ExtractError::Corrupt(_))
        ));
        assert!(matches!(
            TarExtractor.extract(&[0x1f, 0x8b, 0x00, 0x00]),
            Err(ExtractError::Corrupt(_))
        ));
    }

    #[test]
    fn test_tree_is_removed_on_drop() {
        let bytes = zip_bytes(&[("data.csv", "a,b\n")]);
        let root = {
            let tree = ZipExtractor.extract(&bytes).unwrap();
            tree.path().to_path_buf()
        };
        assert!(!root.exists());
    }
}
