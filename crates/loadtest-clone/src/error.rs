//! Error types for script cloning.

use delimited_rows::DelimitedError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a clone run or one of its steps.
#[derive(Error, Debug)]
pub enum CloneError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited file error.
    #[error("Data file error: {0}")]
    Delimited(#[from] DelimitedError),

    /// The seed script could not be read.
    #[error("Script file {path} error: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The seed script exists but is not a regular file.
    #[error("Script file {0} is not a regular file")]
    NotRegularFile(PathBuf),

    /// A match pattern was empty.
    #[error("Match pattern must not be empty")]
    EmptyPattern,

    /// A fragment could not be split or rebound as requested.
    #[error("Fragment error: {0}")]
    Fragment(String),
}
