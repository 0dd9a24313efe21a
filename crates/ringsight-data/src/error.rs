use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in ringsight-data.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// CSV read/parse error, with the file it occurred in.
    #[error("failed to read {}: {source}", path.display())]
    Csv {
        /// File being read.
        path: PathBuf,
        /// Underlying CSV error (carries the record position).
        source: csv::Error,
    },
    /// Graph construction violated a core invariant.
    #[error("graph error: {0}")]
    Graph(#[from] ringsight_core::Error),
}

/// Result type alias for ringsight-data.
pub type Result<T> = std::result::Result<T, Error>;
