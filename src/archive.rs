//! Zip container around FreeCAD documents
//!
//! An `.FCStd` file is a zip archive whose `Document.xml` entry holds the
//! document produced by [`crate::bridge::fcstd`]. Other entries (shapes,
//! thumbnails, GUI state) are ignored on read and never written.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

use crate::bridge::fcstd::FcstdBridge;
use crate::bridge::{FormatBridge, TranslationConfig, Translated};
use crate::error::{Error, Result};
use crate::feature::PartFile;

/// Name of the document entry inside the archive
pub const DOCUMENT_ENTRY: &str = "Document.xml";

/// Write `document` as the document entry of a new archive
///
/// Returns the writer after the archive is finished.
pub fn write_archive<W: Write + Seek>(writer: W, document: &str) -> Result<W> {
    let mut zip = zip::ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file(DOCUMENT_ENTRY, options)
        .map_err(|e| Error::xml_write(format!("Failed to create document entry: {}", e)))?;
    zip.write_all(document.as_bytes())
        .map_err(|e| Error::xml_write(format!("Failed to write document entry: {}", e)))?;

    zip.finish()
        .map_err(|e| Error::xml_write(format!("Failed to finish archive: {}", e)))
}

/// Read the document entry of an archive
pub fn read_archive<R: Read + Seek>(reader: R) -> Result<String> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entry = match archive.by_name(DOCUMENT_ENTRY) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(Error::MissingFile(DOCUMENT_ENTRY.to_string())),
        Err(e) => return Err(e.into()),
    };
    let mut document = String::new();
    entry.read_to_string(&mut document)?;
    Ok(document)
}

/// Export `part` and write it to an `.FCStd` file at `path`
pub fn save<P: AsRef<Path>>(path: P, part: &PartFile, config: &TranslationConfig) -> Result<Translated<()>> {
    let exported = FcstdBridge::new(*config).export(part)?;
    let file = File::create(path.as_ref())?;
    let mut writer = write_archive(BufWriter::new(file), &exported.output)?;
    writer.flush()?;
    debug!("Saved part '{}' to {}", part.name, path.as_ref().display());
    Ok(exported.map(|_| ()))
}

/// Read an `.FCStd` file at `path` and import its document
pub fn load<P: AsRef<Path>>(path: P, config: &TranslationConfig) -> Result<Translated<PartFile>> {
    let file = File::open(path.as_ref())?;
    let document = read_archive(BufReader::new(file))?;
    debug!("Loaded {} bytes of document from {}", document.len(), path.as_ref().display());
    FcstdBridge::new(*config).import(&document)
}
