//! Typed failures surfaced by the file readers.
//!
//! Only conditions that make a whole read pointless are errors. Ragged rows,
//! unparsable tokens, and missing reference files are absorbed by the readers
//! and never show up here.

use std::{io, path::PathBuf};

use thiserror::Error;

pub type ReadResult<T> = Result<T, ReadError>;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("File not found: {path:?}")]
    FileNotFound { path: PathBuf },

    #[error("Unable to read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No '@' header line found in {path:?}")]
    NoHeaderFound { path: PathBuf },

    #[error("Header blocks in {path:?} contain no data rows")]
    NoDataFound { path: PathBuf },

    #[error("No data tables found in {path:?}")]
    NoDataTables { path: PathBuf },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ReadError {
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            ReadError::FileNotFound { path }
        } else {
            ReadError::Unreadable { path, source }
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ReadError::Config {
            message: message.into(),
        }
    }

    /// True when the file was readable but did not have the shape this reader
    /// expects, so another reader may still succeed.
    pub fn is_format_mismatch(&self) -> bool {
        matches!(
            self,
            ReadError::NoHeaderFound { .. }
                | ReadError::NoDataFound { .. }
                | ReadError::NoDataTables { .. }
        )
    }
}
