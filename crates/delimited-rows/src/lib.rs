//! Delimited flat files for script-cloner.
//!
//! This crate reads separator-delimited text files (a header line of column
//! names, then one record per line) into immutable [`Row`]s, collects them in
//! a [`RowTrack`] with a round-robin cursor, and orders them with a
//! partitioning sort whose comparator takes a configuration value.
//!
//! # Example
//!
//! ```ignore
//! use delimited_rows::{RecordReader, RowTrack, Separator};
//! use std::io::BufReader;
//!
//! let file = std::fs::File::open("colors.db")?;
//! let mut reader = RecordReader::new(BufReader::new(file), Separator::default());
//! let mut track = RowTrack::new(0);
//! track.read_header(&mut reader)?;
//! track.bulk_load(&mut reader)?;
//! track.sort_rows("name", reader.separator())?;
//! ```

mod error;
pub mod order;
pub mod row;
pub mod split;
pub mod track;

pub use error::DelimitedError;
pub use order::{apply_permutation, sort_by, sort_by_config};
pub use row::{RecordReader, Row};
pub use split::{FieldRecord, Separator, DEFAULT_SEPARATOR, ESCAPE};
pub use track::{compare_rows, RowTrack, DEFAULT_ALLOCATION};
