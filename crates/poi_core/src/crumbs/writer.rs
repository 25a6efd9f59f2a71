use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::staging::StagedFile;

use super::types::BreadcrumbError;

pub const EXTRACTED_BREADCRUMB_HEADER: [&str; 7] =
    ["match_id", "player_id", "time_step", "x", "y", "z", "life"];

/// One row of extractor output. Samples without a life value are never
/// written, so `life` is always present here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedBreadcrumb {
    pub match_id: i64,
    pub player_id: i64,
    pub time_step: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub life: f64,
}

/// Streams rows into a staged file that replaces `path` on
/// [`BreadcrumbCsvWriter::finish`]. Dropping the writer without finishing
/// leaves the previous output untouched.
pub struct BreadcrumbCsvWriter {
    path: PathBuf,
    // Declared before `staged` so the file handle closes before cleanup.
    writer: csv::Writer<File>,
    staged: StagedFile,
    rows_written: usize,
}

impl BreadcrumbCsvWriter {
    pub fn create(path: &Path) -> Result<Self, BreadcrumbError> {
        let write_err = |source: csv::Error| BreadcrumbError::Write {
            path: path.to_path_buf(),
            source,
        };
        let staged = StagedFile::new(path).map_err(|error| write_err(error.into()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(staged.partial_path())
            .map_err(write_err)?;
        writer
            .write_record(EXTRACTED_BREADCRUMB_HEADER)
            .map_err(write_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            staged,
            rows_written: 0,
        })
    }

    pub fn write(&mut self, row: &ExtractedBreadcrumb) -> Result<(), BreadcrumbError> {
        self.writer.serialize(row).map_err(|source| BreadcrumbError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), BreadcrumbError> {
        self.writer.flush().map_err(|error| BreadcrumbError::Write {
            path: self.path.clone(),
            source: error.into(),
        })
    }

    pub fn finish(mut self) -> Result<usize, BreadcrumbError> {
        self.flush()?;
        let Self {
            path,
            writer,
            staged,
            rows_written,
        } = self;
        drop(writer);
        staged.commit().map_err(|error| BreadcrumbError::Write {
            path,
            source: error.into(),
        })?;
        Ok(rows_written)
    }
}
