//! Growable row collections for one delimited source.

use crate::error::DelimitedError;
use crate::order::{apply_permutation, sort_by_config};
use crate::row::{RecordReader, Row};
use crate::split::Separator;
use std::cmp::Ordering;
use std::io::BufRead;
use tracing::debug;

/// Initial row capacity when no record count was requested.
pub const DEFAULT_ALLOCATION: usize = 128;

/// Upper bound on the initial capacity taken from a requested count.
const MAX_INITIAL_ALLOCATION: usize = 1 << 16;

/// Rows read from one source, with their column definitions and a read cursor.
#[derive(Debug, Default)]
pub struct RowTrack {
    header: Option<Row>,
    rows: Vec<Row>,
    requested: usize,
    cursor: usize,
}

impl RowTrack {
    /// Create an empty collection wanting `requested` rows (0 = all).
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Self::default()
        }
    }

    /// Create an empty collection with known column definitions.
    pub fn with_header(header: Row) -> Self {
        Self {
            header: Some(header),
            ..Self::default()
        }
    }

    /// Column definitions, once known.
    pub fn header(&self) -> Option<&Row> {
        self.header.as_ref()
    }

    /// Read the first non-blank line of `reader` as the column definitions.
    ///
    /// Returns `false` when the source is empty.
    pub fn read_header<R: BufRead>(
        &mut self,
        reader: &mut RecordReader<R>,
    ) -> Result<bool, DelimitedError> {
        match reader.read_next()? {
            Some(header) => {
                self.header = Some(header);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Number of rows wanted from the source (0 = all).
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Want `extra` more rows.
    pub fn add_requested(&mut self, extra: usize) {
        self.requested += extra;
    }

    /// Multiply the number of rows wanted.
    pub fn scale_requested(&mut self, factor: usize) {
        self.requested = self.requested.saturating_mul(factor);
    }

    /// Read rows until end of input or until the requested count is reached.
    ///
    /// Records with fewer fields than there are column definitions are
    /// skipped without complaint; definition files rely on this to carry
    /// comment lines. Returns the number of rows added.
    pub fn bulk_load<R: BufRead>(
        &mut self,
        reader: &mut RecordReader<R>,
    ) -> Result<usize, DelimitedError> {
        let min_fields = self.header.as_ref().map_or(1, Row::cols).max(1);
        let initial = if self.requested > 0 {
            self.requested.min(MAX_INITIAL_ALLOCATION)
        } else {
            DEFAULT_ALLOCATION
        };
        if self.rows.capacity() < initial {
            self.rows.reserve_exact(initial - self.rows.len());
        }

        let before = self.rows.len();
        let mut skipped = 0usize;
        while self.requested == 0 || self.rows.len() < self.requested {
            let Some(record) = reader.next_record()? else {
                break;
            };
            if record.len() < min_fields {
                skipped += 1;
                continue;
            }
            let Some(row) = Row::from_record(record) else {
                continue;
            };
            if self.rows.len() == self.rows.capacity() {
                let grow = self.rows.capacity().max(1);
                self.rows.reserve_exact(grow);
            }
            self.rows.push(row);
        }

        let loaded = self.rows.len() - before;
        debug!("Loaded {loaded} rows, skipped {skipped} short records");
        Ok(loaded)
    }

    /// All loaded rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of loaded rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows are loaded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the current row.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The row under the cursor.
    pub fn current_row(&self) -> Option<&Row> {
        self.rows.get(self.cursor)
    }

    /// Move the cursor on by one, wrapping to the first row.
    pub fn advance(&mut self) {
        self.cursor += 1;
        if self.cursor >= self.rows.len() {
            self.cursor = 0;
        }
    }

    /// Position of column `name` in the column definitions.
    pub fn column_index(&self, name: &[u8]) -> Option<usize> {
        self.header.as_ref().and_then(|h| h.column_index(name))
    }

    /// Sort the rows on the named key columns, given as one delimited string.
    pub fn sort_rows(
        &mut self,
        key_columns: &str,
        separator: &Separator,
    ) -> Result<(), DelimitedError> {
        let header = self.header.as_ref().ok_or(DelimitedError::MissingHeader)?;
        let keys = Row::headings(key_columns, separator)
            .ok_or_else(|| DelimitedError::UnknownColumn(key_columns.to_string()))?;
        let indices = keys
            .fields()
            .map(|name| {
                header.column_index(name).ok_or_else(|| {
                    DelimitedError::UnknownColumn(String::from_utf8_lossy(name).into_owned())
                })
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let rows = &self.rows;
        let mut order: Vec<usize> = (0..rows.len()).collect();
        sort_by_config(&mut order, &indices[..], |a, b, keys| {
            compare_rows(&rows[*a], &rows[*b], keys)
        });
        apply_permutation(&mut self.rows, order);
        Ok(())
    }

    /// Widest value seen in each defined column.
    pub fn column_widths(&self) -> Vec<usize> {
        let cols = self.header.as_ref().map_or(0, Row::cols);
        let mut widths = vec![0; cols];
        for row in &self.rows {
            for (width, field) in widths.iter_mut().zip(row.fields()) {
                *width = (*width).max(field.len());
            }
        }
        widths
    }
}

/// Compare two rows field by field on the given column indices.
pub fn compare_rows(a: &Row, b: &Row, keys: &[usize]) -> Ordering {
    keys.iter()
        .map(|&key| a.field(key).cmp(&b.field(key)))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn reader(text: &str) -> RecordReader<Cursor<Vec<u8>>> {
        RecordReader::new(Cursor::new(text.as_bytes().to_vec()), Separator::default())
    }

    fn first_fields(track: &RowTrack) -> Vec<String> {
        track
            .rows()
            .iter()
            .map(|row| row.field_str(0).unwrap_or_default().into_owned())
            .collect()
    }

    #[test]
    fn test_bulk_load_all_rows() {
        let mut input = reader("name|age\nann|31\nbob|27\ncid|45\n");
        let mut track = RowTrack::new(0);
        assert!(track.read_header(&mut input).unwrap());

        let loaded = track.bulk_load(&mut input).unwrap();
        assert_eq!(loaded, 3);
        assert_eq!(first_fields(&track), vec!["ann", "bob", "cid"]);
        assert_eq!(track.column_index(b"age"), Some(1));
    }

    #[test]
    fn test_bulk_load_stops_at_requested_count() {
        let mut input = reader("name\nr1\nr2\nr3\nr4\nr5\n");
        let mut track = RowTrack::new(3);
        track.read_header(&mut input).unwrap();

        assert_eq!(track.bulk_load(&mut input).unwrap(), 3);
        assert_eq!(track.len(), 3);

        let mut rest = String::new();
        input.get_mut().read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "r4\nr5\n");
    }

    #[test]
    fn test_bulk_load_skips_short_records() {
        let sep = Separator::default();
        let header = Row::headings("LINE_NO|MATCH|DATA_FILE|COLUMN|DISPOSITION", &sep).unwrap();
        let mut track = RowTrack::with_header(header);
        let mut input = reader("# a comment\n1|XX|colors|name|F\n\n2|YY|sizes\n3|ZZ|sizes|size|F|extra\n");

        assert_eq!(track.bulk_load(&mut input).unwrap(), 2);
        assert_eq!(first_fields(&track), vec!["1", "3"]);
    }

    #[test]
    fn test_bulk_load_grows_past_default_allocation() {
        let mut text = String::from("n\n");
        for i in 0..(DEFAULT_ALLOCATION * 2 + 5) {
            text.push_str(&format!("{i}\n"));
        }
        let mut input = reader(&text);
        let mut track = RowTrack::new(0);
        track.read_header(&mut input).unwrap();

        assert_eq!(track.bulk_load(&mut input).unwrap(), DEFAULT_ALLOCATION * 2 + 5);
        assert_eq!(track.rows()[DEFAULT_ALLOCATION * 2 + 4].field(0), Some(&b"260"[..]));
    }

    #[test]
    fn test_empty_source_has_no_header() {
        let mut input = reader("");
        let mut track = RowTrack::new(0);
        assert!(!track.read_header(&mut input).unwrap());
        assert!(track.header().is_none());
    }

    #[test]
    fn test_cursor_wraps_after_row_count_advances() {
        let mut input = reader("c\na\nb\nc\n");
        let mut track = RowTrack::new(0);
        track.read_header(&mut input).unwrap();
        track.bulk_load(&mut input).unwrap();

        assert_eq!(track.cursor(), 0);
        for _ in 0..track.len() {
            track.advance();
        }
        assert_eq!(track.cursor(), 0);

        track.advance();
        assert_eq!(track.current_row().and_then(|r| r.field(0)), Some(&b"b"[..]));
    }

    #[test]
    fn test_sort_rows_on_key_columns() {
        let mut input = reader("name|team\ncid|b\nann|b\nbob|a\ndee|a\n");
        let mut track = RowTrack::new(0);
        track.read_header(&mut input).unwrap();
        track.bulk_load(&mut input).unwrap();

        track.sort_rows("team|name", &Separator::default()).unwrap();
        assert_eq!(first_fields(&track), vec!["bob", "dee", "ann", "cid"]);
    }

    #[test]
    fn test_sort_rows_unknown_column() {
        let mut input = reader("name\nx\n");
        let mut track = RowTrack::new(0);
        track.read_header(&mut input).unwrap();
        track.bulk_load(&mut input).unwrap();

        let err = track.sort_rows("missing", &Separator::default()).unwrap_err();
        assert!(matches!(err, DelimitedError::UnknownColumn(name) if name == "missing"));
    }

    #[test]
    fn test_column_widths() {
        let mut input = reader("name|city\nann|Leeds\nbartholomew|Ely\n");
        let mut track = RowTrack::new(0);
        track.read_header(&mut input).unwrap();
        track.bulk_load(&mut input).unwrap();

        assert_eq!(track.column_widths(), vec![11, 5]);
    }
}
