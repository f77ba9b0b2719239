//! Record splitting for delimited lines.
//!
//! A [`FieldRecord`] is scratch space that is reused for every line read from a
//! file. Splitting never allocates a new record; the raw line and, in
//! single-character mode, an unescaped copy of it are kept in buffers owned by
//! the record and each field is a byte range into one of them.

use crate::error::DelimitedError;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Escape marker recognised when the separator is a single byte.
pub const ESCAPE: u8 = b'\\';

/// Default field separator.
pub const DEFAULT_SEPARATOR: &str = "|";

/// Field separator for delimited files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Separator {
    /// Single byte; backslash escapes are honoured.
    Single(u8),
    /// Multi-byte; matched as an exact substring, no escapes.
    Multi(Vec<u8>),
}

impl Separator {
    /// Build a separator from its textual form.
    pub fn new(text: &str) -> Result<Self, DelimitedError> {
        match text.as_bytes() {
            [] => Err(DelimitedError::EmptySeparator),
            [byte] => Ok(Separator::Single(*byte)),
            bytes => Ok(Separator::Multi(bytes.to_vec())),
        }
    }

    /// The separator bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Separator::Single(byte) => std::slice::from_ref(byte),
            Separator::Multi(bytes) => bytes,
        }
    }

    /// Split `line` into a fresh record.
    pub fn split(&self, line: &[u8]) -> FieldRecord {
        let mut record = FieldRecord::new();
        record.split(line, self);
        record
    }

    /// Join fields back into one line, without a terminator.
    ///
    /// In single-byte mode separator and escape bytes inside a field are
    /// escaped, so `split(join(fields))` returns the same fields.
    pub fn join<'a, I>(&self, fields: I) -> Vec<u8>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut out = Vec::new();
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(self.as_bytes());
            }
            match self {
                Separator::Single(sep) if *sep != ESCAPE => {
                    for &byte in field {
                        if byte == *sep || byte == ESCAPE {
                            out.push(ESCAPE);
                        }
                        out.push(byte);
                    }
                }
                _ => out.extend_from_slice(field),
            }
        }
        out
    }
}

impl Default for Separator {
    fn default() -> Self {
        Separator::Single(b'|')
    }
}

impl FromStr for Separator {
    type Err = DelimitedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Separator::new(s)
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

/// One line split into fields.
#[derive(Debug, Default, Clone)]
pub struct FieldRecord {
    line: Vec<u8>,
    unescaped: Vec<u8>,
    fields: Vec<Range<usize>>,
    // Field ranges index `unescaped` rather than `line`.
    escaped: bool,
}

impl FieldRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of this record with the fields of `line`.
    ///
    /// Trailing carriage returns and line feeds are removed from the last
    /// field only. A line that is empty once they are removed has no fields.
    pub fn split(&mut self, line: &[u8], separator: &Separator) {
        self.line.clear();
        self.line.extend_from_slice(line);
        self.unescaped.clear();
        self.fields.clear();
        self.escaped = false;

        let content_len = content_len(line);
        if content_len == 0 {
            return;
        }
        match separator {
            Separator::Single(sep) => self.split_escaped(content_len, *sep),
            Separator::Multi(pattern) => self.split_substring(content_len, pattern),
        }
    }

    fn split_escaped(&mut self, content_len: usize, sep: u8) {
        self.escaped = true;
        let escapes = sep != ESCAPE;
        let bytes = &self.line[..content_len];
        let mut start = 0;
        let mut i = 0;
        while i < content_len {
            let byte = bytes[i];
            if escapes
                && byte == ESCAPE
                && i + 1 < content_len
                && (bytes[i + 1] == sep || bytes[i + 1] == ESCAPE)
            {
                self.unescaped.push(bytes[i + 1]);
                i += 2;
                continue;
            }
            if byte == sep {
                self.fields.push(start..self.unescaped.len());
                start = self.unescaped.len();
            } else {
                self.unescaped.push(byte);
            }
            i += 1;
        }
        self.fields.push(start..self.unescaped.len());
    }

    fn split_substring(&mut self, content_len: usize, pattern: &[u8]) {
        let mut start = 0;
        while let Some(pos) = find_subslice(&self.line[start..content_len], pattern) {
            self.fields.push(start..start + pos);
            start += pos + pattern.len();
        }
        self.fields.push(start..content_len);
    }

    /// The raw line, including any terminator.
    pub fn line(&self) -> &[u8] {
        &self.line
    }

    /// Number of fields found.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the line had no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Bytes of field `index`.
    pub fn field(&self, index: usize) -> Option<&[u8]> {
        let source = self.source();
        self.fields.get(index).map(|range| &source[range.clone()])
    }

    /// Iterate over all fields in order.
    pub fn fields(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let source = self.source();
        self.fields.iter().map(move |range| &source[range.clone()])
    }

    fn source(&self) -> &[u8] {
        if self.escaped {
            &self.unescaped
        } else {
            &self.line
        }
    }
}

/// Length of `line` once trailing CR/LF bytes are dropped.
fn content_len(line: &[u8]) -> usize {
    line.iter()
        .rposition(|&b| b != b'\n' && b != b'\r')
        .map_or(0, |pos| pos + 1)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fields_of(record: &FieldRecord) -> Vec<String> {
        record
            .fields()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect()
    }

    #[test]
    fn test_separator_from_text() {
        assert_eq!(Separator::new("|").unwrap(), Separator::Single(b'|'));
        assert_eq!(
            Separator::new("::").unwrap(),
            Separator::Multi(b"::".to_vec())
        );
        assert!(matches!(
            Separator::new(""),
            Err(DelimitedError::EmptySeparator)
        ));
        assert_eq!(Separator::default().to_string(), DEFAULT_SEPARATOR);
    }

    #[test]
    fn test_single_separator_split() {
        let record = Separator::default().split(b"1|XX|colors|name|F\n");
        assert_eq!(record.len(), 5);
        assert_eq!(fields_of(&record), vec!["1", "XX", "colors", "name", "F"]);
        assert_eq!(record.line(), b"1|XX|colors|name|F\n");
    }

    #[test]
    fn test_consecutive_separators_yield_empty_fields() {
        let record = Separator::default().split(b"a||b|\n");
        assert_eq!(fields_of(&record), vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_escaped_separator_and_escape() {
        let record = Separator::default().split(b"a\\|b|c\\\\|d\\x\n");
        assert_eq!(fields_of(&record), vec!["a|b", "c\\", "d\\x"]);
        // The raw line is untouched by escape processing.
        assert_eq!(record.line(), b"a\\|b|c\\\\|d\\x\n");
    }

    #[test]
    fn test_multi_separator_split_ignores_escapes() {
        let sep = Separator::new("::").unwrap();
        let record = sep.split(b"a::b\\::::c\r\n");
        assert_eq!(fields_of(&record), vec!["a", "b\\", "", "c"]);
    }

    #[test]
    fn test_multi_separator_field_count() {
        let sep = Separator::new("<>").unwrap();
        let record = sep.split(b"x<>y<><>z");
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn test_no_separator_is_one_field() {
        let record = Separator::default().split(b"name\n");
        assert_eq!(fields_of(&record), vec!["name"]);
    }

    #[test]
    fn test_trailing_crlf_stripped_from_last_field_only() {
        let record = Separator::default().split(b"a\rb|c\r\n\r\n");
        assert_eq!(fields_of(&record), vec!["a\rb", "c"]);
    }

    #[test]
    fn test_empty_line_has_no_fields() {
        assert!(Separator::default().split(b"\r\n").is_empty());
        assert!(Separator::default().split(b"").is_empty());
        assert!(Separator::new("::").unwrap().split(b"\n").is_empty());
    }

    #[test]
    fn test_record_reuse_clears_previous_fields() {
        let sep = Separator::default();
        let mut record = FieldRecord::new();
        record.split(b"a|b|c\n", &sep);
        record.split(b"d\n", &sep);
        assert_eq!(fields_of(&record), vec!["d"]);
        assert_eq!(record.field(1), None);
    }

    #[test]
    fn test_join_escapes_single_separator() {
        let sep = Separator::default();
        let fields: Vec<&[u8]> = vec![b"a|b", b"c\\", b""];
        assert_eq!(sep.join(fields), b"a\\|b|c\\\\|".to_vec());
    }

    proptest! {
        #[test]
        fn split_then_join_round_trips_single(
            fields in prop::collection::vec("[a-z|\\\\]{0,8}", 2..6)
        ) {
            let sep = Separator::default();
            let mut line = sep.join(fields.iter().map(|f| f.as_bytes()));
            let joined = line.clone();
            line.extend_from_slice(b"\r\n");

            let record = sep.split(&line);
            prop_assert_eq!(record.len(), fields.len());
            prop_assert_eq!(fields_of(&record), fields.clone());
            prop_assert_eq!(sep.join(record.fields()), joined);
        }

        #[test]
        fn split_then_join_round_trips_multi(
            fields in prop::collection::vec("[a-z|\\\\]{0,8}", 2..6)
        ) {
            let sep = Separator::new("::").unwrap();
            let mut line = sep.join(fields.iter().map(|f| f.as_bytes()));
            let joined = line.clone();
            line.push(b'\n');

            let record = sep.split(&line);
            prop_assert_eq!(record.len(), fields.len());
            prop_assert_eq!(sep.join(record.fields()), joined);
        }
    }
}
