//! Error types for delimited file handling.

use thiserror::Error;

/// Errors that can occur while reading or ordering delimited rows.
#[derive(Error, Debug)]
pub enum DelimitedError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The field separator was empty.
    #[error("Field separator must not be empty")]
    EmptySeparator,

    /// A column name was not present in the column definitions.
    #[error("Column '{0}' not found in column definitions")]
    UnknownColumn(String),

    /// The collection has no column definitions yet.
    #[error("No header line available")]
    MissingHeader,
}
