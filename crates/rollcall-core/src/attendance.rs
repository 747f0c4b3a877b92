//! Daily attendance CSV files.
//!
//! One file per calendar day, `Attendance_<dd-mm-yy>.csv`, opened in append
//! mode for every write. The header row is written only when the file did
//! not exist just before the write.

use crate::types::AttendanceRow;
use chrono::NaiveDate;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HEADER: [&str; 4] = ["NAME", "CLASS", "BRANCH", "TIME"];
pub const DEFAULT_DIR: &str = "Attendance";

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("failed to create attendance directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("failed to flush {path}: {source}")]
    Flush {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Append-only store of attendance rows, keyed by date.
#[derive(Debug, Clone)]
pub struct AttendanceLog {
    dir: PathBuf,
}

impl AttendanceLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the log directory if it is missing.
    pub fn ensure_dir(&self) -> Result<(), AttendanceError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| AttendanceError::CreateDir {
            path: self.dir.display().to_string(),
            source,
        })
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("Attendance_{}.csv", date.format("%d-%m-%y")))
    }

    /// Append `row` to the file for `date`, writing the header first if the
    /// file is new. Returns the path written.
    pub fn append(&self, row: &AttendanceRow, date: NaiveDate) -> Result<PathBuf, AttendanceError> {
        let path = self.path_for(date);
        let shown = path.display().to_string();
        let existed = path.is_file();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AttendanceError::Open {
                path: shown.clone(),
                source,
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if !existed {
            writer.write_record(HEADER).map_err(|source| AttendanceError::Write {
                path: shown.clone(),
                source,
            })?;
        }
        writer
            .write_record(row.as_record())
            .map_err(|source| AttendanceError::Write {
                path: shown.clone(),
                source,
            })?;
        writer.flush().map_err(|source| AttendanceError::Flush {
            path: shown.clone(),
            source,
        })?;

        tracing::info!(
            path = %shown,
            name = %row.name,
            time = %row.time,
            header = !existed,
            "attendance recorded"
        );
        Ok(path)
    }
}
