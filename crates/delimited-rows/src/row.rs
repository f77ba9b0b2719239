//! Immutable rows and the line reader that produces them.

use crate::error::DelimitedError;
use crate::split::{FieldRecord, Separator};
use std::borrow::Cow;
use std::fmt;
use std::io::BufRead;
use std::ops::Range;

/// One delimited record, packed into a single buffer.
///
/// The buffer holds the original line (terminator included) followed by the
/// bytes of every field. A row owns its storage outright and never refers
/// back to the [`FieldRecord`] it was built from.
#[derive(Clone, PartialEq, Eq)]
pub struct Row {
    buf: Box<[u8]>,
    line_len: usize,
    fields: Box<[Range<usize>]>,
}

impl Row {
    /// Pack a split record into a row. Records without fields produce `None`.
    pub fn from_record(record: &FieldRecord) -> Option<Self> {
        if record.is_empty() {
            return None;
        }
        let line = record.line();
        let size = line.len() + record.fields().map(<[u8]>::len).sum::<usize>();

        let mut buf = Vec::with_capacity(size);
        buf.extend_from_slice(line);
        let mut fields = Vec::with_capacity(record.len());
        for field in record.fields() {
            let start = buf.len();
            buf.extend_from_slice(field);
            fields.push(start..buf.len());
        }

        Some(Self {
            buf: buf.into_boxed_slice(),
            line_len: line.len(),
            fields: fields.into_boxed_slice(),
        })
    }

    /// Build a column definition row from a heading string instead of a file.
    pub fn headings(text: &str, separator: &Separator) -> Option<Self> {
        Self::from_record(&separator.split(text.as_bytes()))
    }

    /// The original line, including its terminator if it had one.
    pub fn line(&self) -> &[u8] {
        &self.buf[..self.line_len]
    }

    /// Number of fields.
    pub fn cols(&self) -> usize {
        self.fields.len()
    }

    /// Bytes of field `index`.
    pub fn field(&self, index: usize) -> Option<&[u8]> {
        self.fields.get(index).map(|range| &self.buf[range.clone()])
    }

    /// Field `index` as text, replacing invalid UTF-8.
    pub fn field_str(&self, index: usize) -> Option<Cow<'_, str>> {
        self.field(index).map(String::from_utf8_lossy)
    }

    /// Iterate over the fields in order.
    pub fn fields(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.fields.iter().map(move |range| &self.buf[range.clone()])
    }

    /// Position of the column called `name`. Case sensitive.
    pub fn column_index(&self, name: &[u8]) -> Option<usize> {
        self.fields().position(|field| field == name)
    }

    /// Fields rejoined with `separator`, for messages.
    pub fn display_with(&self, separator: &Separator) -> String {
        String::from_utf8_lossy(&separator.join(self.fields())).into_owned()
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.fields().map(String::from_utf8_lossy))
            .finish()
    }
}

/// Reads delimited lines from a buffered source.
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    separator: Separator,
    line: Vec<u8>,
    record: FieldRecord,
    lines_read: u64,
}

impl<R: BufRead> RecordReader<R> {
    /// Wrap `inner`, splitting lines on `separator`.
    pub fn new(inner: R, separator: Separator) -> Self {
        Self {
            inner,
            separator,
            line: Vec::new(),
            record: FieldRecord::new(),
            lines_read: 0,
        }
    }

    /// Read and split the next line. Returns `None` at end of input.
    ///
    /// The record is scratch space and is overwritten by the next call.
    pub fn next_record(&mut self) -> Result<Option<&FieldRecord>, DelimitedError> {
        self.line.clear();
        if self.inner.read_until(b'\n', &mut self.line)? == 0 {
            return Ok(None);
        }
        self.lines_read += 1;
        self.record.split(&self.line, &self.separator);
        Ok(Some(&self.record))
    }

    /// Read the next non-blank line as a row. Returns `None` at end of input.
    pub fn read_next(&mut self) -> Result<Option<Row>, DelimitedError> {
        loop {
            match self.next_record()? {
                None => return Ok(None),
                Some(record) => {
                    if let Some(row) = Row::from_record(record) {
                        return Ok(Some(row));
                    }
                }
            }
        }
    }

    /// The separator lines are split on.
    pub fn separator(&self) -> &Separator {
        &self.separator
    }

    /// Number of physical lines consumed so far.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Mutable access to the wrapped source, positioned after the last line read.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}
