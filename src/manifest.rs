//! Run manifest: one CSV row per processed image.
//!
//! Rows accumulate in memory for the whole run and are written exactly once at
//! the end. The file is written to a sibling temporary path and renamed over
//! the target, replacing any manifest from an earlier run.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::selector::SelectedImage;

/// File name of the manifest inside the output root.
pub const MANIFEST_FILE_NAME: &str = "manifest.csv";

/// Header row, in column order.
pub const MANIFEST_COLUMNS: [&str; 9] = [
    "category",
    "title",
    "file_url",
    "page_url",
    "mime",
    "license_short",
    "license_url",
    "artist",
    "credit",
];

const RECORD_TERMINATOR: &str = "\r\n";
const TEMP_SUFFIX: &str = ".tmp";

/// Errors produced while writing the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest or its temporary file could not be written.
    #[error("failed to write manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ManifestError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Ordered rows of every image that was downloaded or already on disk.
#[derive(Debug, Default)]
pub struct Manifest {
    rows: Vec<SelectedImage>,
}

impl Manifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row. Rows are never removed or reordered.
    pub fn push(&mut self, image: SelectedImage) {
        self.rows.push(image);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row count per category key.
    #[must_use]
    pub fn counts_by_category(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.category().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Serializes all rows, header first.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        push_csv_row(&mut output, MANIFEST_COLUMNS.iter().copied());
        for row in &self.rows {
            let record = row.record();
            push_csv_row(
                &mut output,
                [
                    row.category(),
                    record.title.as_str(),
                    record.file_url.as_str(),
                    record.page_url.as_str(),
                    record.mime.as_str(),
                    record.license_short.as_str(),
                    record.license_url.as_str(),
                    record.artist.as_str(),
                    record.credit.as_str(),
                ],
            );
        }
        output
    }

    /// Writes the manifest to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the temporary file cannot be written or
    /// renamed into place. The temporary file is removed on failure.
    #[instrument(skip(self), fields(rows = self.rows.len(), path = %path.display()))]
    pub fn write_csv(&self, path: &Path) -> Result<(), ManifestError> {
        let temp_path = temp_path_for(path);

        if let Err(error) = self.write_to(&temp_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(error);
        }
        if let Err(source) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(ManifestError::io(path, source));
        }

        debug!("manifest written");
        Ok(())
    }

    fn write_to(&self, temp_path: &Path) -> Result<(), ManifestError> {
        let file = fs::File::create(temp_path).map_err(|e| ManifestError::io(temp_path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(self.to_csv().as_bytes())
            .map_err(|e| ManifestError::io(temp_path, e))?;
        writer.flush().map_err(|e| ManifestError::io(temp_path, e))
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_else(|| MANIFEST_FILE_NAME.into());
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

fn push_csv_row<'a>(output: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (index, field) in fields.into_iter().enumerate() {
        if index > 0 {
            output.push(',');
        }
        output.push_str(&escape_csv_field(field));
    }
    output.push_str(RECORD_TERMINATOR);
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
