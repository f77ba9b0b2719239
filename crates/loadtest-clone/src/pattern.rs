//! Exact byte-string matching for definition patterns.

use crate::error::CloneError;

/// Something that locates fixed-length matches in a line.
pub trait Matcher {
    /// Length of every match.
    fn len(&self) -> usize;

    /// Whether the pattern is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of the first match starting at or after `from`.
    fn find(&self, haystack: &[u8], from: usize) -> Option<usize>;

    /// Start positions of all non-overlapping matches, left to right.
    fn find_all(&self, haystack: &[u8]) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut from = 0;
        while let Some(start) = self.find(haystack, from) {
            starts.push(start);
            from = start + self.len().max(1);
        }
        starts
    }
}

/// Compiled exact-match pattern using a bad-character skip table.
#[derive(Clone)]
pub struct ExactPattern {
    needle: Vec<u8>,
    skip: [usize; 256],
}

impl ExactPattern {
    /// Compile `pattern`. Empty patterns are rejected.
    pub fn compile(pattern: &[u8]) -> Result<Self, CloneError> {
        if pattern.is_empty() {
            return Err(CloneError::EmptyPattern);
        }
        let last = pattern.len() - 1;
        let mut skip = [pattern.len(); 256];
        for (i, &byte) in pattern[..last].iter().enumerate() {
            skip[byte as usize] = last - i;
        }
        Ok(Self {
            needle: pattern.to_vec(),
            skip,
        })
    }

    /// The pattern bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.needle
    }
}

impl Matcher for ExactPattern {
    fn len(&self) -> usize {
        self.needle.len()
    }

    fn find(&self, haystack: &[u8], from: usize) -> Option<usize> {
        let width = self.needle.len();
        let last = width - 1;
        let mut pos = from;
        while pos + width <= haystack.len() {
            let tail = haystack[pos + last];
            if tail == self.needle[last] && haystack[pos..pos + last] == self.needle[..last] {
                return Some(pos);
            }
            pos += self.skip[tail as usize];
        }
        None
    }
}

impl std::fmt::Debug for ExactPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ExactPattern")
            .field(&String::from_utf8_lossy(&self.needle))
            .finish()
    }
}
