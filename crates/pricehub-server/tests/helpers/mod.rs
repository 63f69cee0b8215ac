//! Shared fixtures for integration tests: real archive bytes built with the
//! same crates the extractor reads them with.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};

/// Build a zip archive from `(entry name, content)` pairs.
pub fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Build a tar archive from `(entry name, content)` pairs.
pub fn build_tar(entries: &[(&str, &str)]) -> Vec<u8> {
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

/// Build a gzip-compressed tar archive.
pub fn build_tar_gz(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&build_tar(entries)).unwrap();
    encoder.finish().unwrap()
}

/// Read the named entry back out of a zip archive.
pub fn read_zip_entry(archive: &[u8], name: &str) -> Vec<u8> {
    use std::io::Read;

    let mut zip = zip::ZipArchive::new(Cursor::new(archive.to_vec())).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    content
}
