//! Definition files: which script lines take values from which data files.
//!
//! A definition file has no header line of its own. Every line is a record
//! with the columns in [`DEFINITION_COLUMNS`]; lines with fewer fields are
//! treated as comments.

use crate::error::CloneError;
use crate::tracker::DataFileId;
use delimited_rows::{sort_by, DelimitedError, RecordReader, Row, RowTrack, Separator};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Column names of a definition file, in order.
pub const DEFINITION_COLUMNS: [&str; 5] = ["LINE_NO", "MATCH", "DATA_FILE", "COLUMN", "DISPOSITION"];

/// How an entry consumes rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// `F`: take a fresh row for each occurrence.
    Fresh,
    /// Any other code. Accepted but has no special meaning.
    Other(String),
}

impl Disposition {
    fn parse(field: &[u8]) -> Self {
        if field.first() == Some(&b'F') {
            Disposition::Fresh
        } else {
            Disposition::Other(String::from_utf8_lossy(field).into_owned())
        }
    }
}

/// One rule from a definition file.
#[derive(Debug, Clone)]
pub struct DefinitionEntry {
    /// Position in the file, counting accepted entries from zero.
    pub ordinal: usize,
    /// Script line (from 1) the pattern applies to.
    pub line_no: usize,
    pub pattern: Vec<u8>,
    pub data_file: String,
    pub column: Vec<u8>,
    pub disposition: Disposition,
    /// Data file the entry was resolved to.
    pub file: Option<DataFileId>,
    text: String,
}

impl DefinitionEntry {
    fn from_row(row: &Row, ordinal: usize, separator: &Separator) -> Result<Self, String> {
        let text = row.display_with(separator);
        let line_no = std::str::from_utf8(field_at(row, 0))
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .ok_or_else(|| format!("({text}) has no usable line number"))?;
        if field_at(row, 1).is_empty() {
            return Err(format!("({text}) has an empty match pattern"));
        }

        Ok(Self {
            ordinal,
            line_no,
            pattern: field_at(row, 1).to_vec(),
            data_file: String::from_utf8_lossy(field_at(row, 2)).into_owned(),
            column: field_at(row, 3).to_vec(),
            disposition: Disposition::parse(field_at(row, 4)),
            file: None,
            text,
        })
    }

    /// The entry's fields joined with the separator, for messages.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_fresh(&self) -> bool {
        self.disposition == Disposition::Fresh
    }
}

fn field_at(row: &Row, index: usize) -> &[u8] {
    row.field(index).unwrap_or_default()
}

/// The entries of one definition file, ordered by script line.
#[derive(Debug)]
pub struct DefinitionSet {
    path: PathBuf,
    entries: Vec<DefinitionEntry>,
}

impl DefinitionSet {
    /// Load and order a definition file.
    ///
    /// Returns `Ok(None)` when the file does not exist or holds no entries.
    /// Entries sharing a line number keep their file order.
    pub fn load(path: &Path, separator: &Separator) -> Result<Option<Self>, CloneError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No definition file at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let columns = DEFINITION_COLUMNS.join(separator.to_string().as_str());
        let header = Row::headings(&columns, separator).ok_or(DelimitedError::MissingHeader)?;
        let mut track = RowTrack::with_header(header);
        let mut reader = RecordReader::new(BufReader::new(file), separator.clone());
        track.bulk_load(&mut reader)?;
        drop(reader);

        let mut entries = Vec::with_capacity(track.len());
        for row in track.rows() {
            match DefinitionEntry::from_row(row, entries.len(), separator) {
                Ok(entry) => entries.push(entry),
                Err(message) => warn!("User Error: {message} in {}", path.display()),
            }
        }
        if entries.is_empty() {
            info!("Definition file {} has no entries", path.display());
            return Ok(None);
        }

        sort_by(&mut entries, |a, b| {
            (a.line_no, a.ordinal).cmp(&(b.line_no, b.ordinal))
        });
        debug!(
            "Loaded {} definition entries from {}",
            entries.len(),
            path.display()
        );
        Ok(Some(Self {
            path: path.to_path_buf(),
            entries,
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[DefinitionEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [DefinitionEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
