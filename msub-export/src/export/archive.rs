//! Archive writer
//!
//! Streams the ordered entries into an in-memory ZIP with DEFLATE
//! compression. Entry names arrive already sanitized; this layer adds
//! nothing to them.

use std::io::{Cursor, Write};
use zip::{write::FileOptions, CompressionMethod};

use crate::error::ExportError;
use crate::export::PackageEntry;

pub fn write_archive(entries: &[PackageEntry]) -> Result<Vec<u8>, ExportError> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        zip.start_file(&entry.name, options).map_err(archive_err)?;
        zip.write_all(&entry.content).map_err(archive_err)?;
    }

    let cursor = zip.finish().map_err(archive_err)?;
    Ok(cursor.into_inner())
}

fn archive_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Archive(e.to_string())
}
