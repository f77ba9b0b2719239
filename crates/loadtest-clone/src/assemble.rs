//! Turning a seed script into write instructions.
//!
//! The script is walked line by line. Think-time lines are swapped for the
//! run's think time. Every other line is matched against the definition
//! entries for that line, and the matches that survive conflict resolution
//! are cut out of the chain and bound to a data file column.
//!
//! Conflicts on one line are settled in this order:
//!
//! - the earlier match wins over any match it overlaps
//! - of two matches starting at the same byte, the longer wins
//! - a match inside text that has already been substituted is dropped
//! - one entry makes at most one substitution per line
//!
//! Repeating an entry in the definition file is how a pattern is substituted
//! more than once on the same line.

use crate::definition::DefinitionEntry;
use crate::error::CloneError;
use crate::pattern::{ExactPattern, Matcher};
use crate::piece::{FragmentChain, FragmentId};
use crate::tracker::DataFileTracker;
use delimited_rows::{sort_by, RowTrack, Separator};
use std::collections::BTreeSet;
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, warn};

/// A problem with the definition file or data that skips one substitution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("User Error: ({entry}) does not match {script}")]
    NoMatch { entry: String, script: String },

    #[error("User Error: data file {data_file} for ({entry}) cannot supply rows")]
    NoRows { entry: String, data_file: String },

    #[error("User Error: ({entry}) does not match any of the columns {columns} in {data_file}")]
    UnknownColumn {
        entry: String,
        columns: String,
        data_file: String,
    },

    #[error("User Error: ({entry}) is for line {line_no}, which was passed before it was reached in {script}")]
    LinePassed {
        entry: String,
        line_no: usize,
        script: String,
    },

    #[error("User Error: ({entry}) is for line {line_no}, beyond the end of {script}")]
    BeyondEnd {
        entry: String,
        line_no: usize,
        script: String,
    },
}

/// Outcome of assembling one script.
#[derive(Debug, Clone, Default)]
pub struct AssemblyReport {
    /// Lines replaced by the think time.
    pub think_time_lines: usize,
    /// Substitutions bound to data files.
    pub substitutions: usize,
    /// Problems reported along the way, in script order.
    pub errors: Vec<UserError>,
}

impl AssemblyReport {
    fn report(&mut self, error: UserError) {
        warn!("{error}");
        self.errors.push(error);
    }
}

/// Text written in place of a think-time line.
pub fn think_time_literal(seconds: u32) -> Vec<u8> {
    format!("\\W{seconds}\\\n").into_bytes()
}

/// Whether `line` (terminator included) is a think-time directive: it starts
/// with `\W` and its last byte before the terminator is `\`.
pub fn is_think_time(line: &[u8]) -> bool {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line.len() >= 3 && line.starts_with(b"\\W") && line.ends_with(b"\\")
}

/// Byte ranges of each line of `script`, each including its newline.
fn line_ranges(script: &[u8]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (pos, &byte) in script.iter().enumerate() {
        if byte == b'\n' {
            ranges.push(start..pos + 1);
            start = pos + 1;
        }
    }
    if start < script.len() {
        ranges.push(start..script.len());
    }
    ranges
}

/// One place an entry's pattern was found.
#[derive(Debug, Clone)]
struct Candidate {
    start: usize,
    len: usize,
    entry: usize,
}

/// Inputs to assembly besides the chain itself.
pub struct Assembly<'a> {
    pub script_name: String,
    pub entries: &'a [DefinitionEntry],
    pub data: &'a DataFileTracker,
    pub separator: &'a Separator,
    pub think_time: u32,
}

impl Assembly<'_> {
    /// Split and bind `chain` for the whole script.
    pub fn run(&self, chain: &mut FragmentChain) -> Result<AssemblyReport, CloneError> {
        let mut report = AssemblyReport::default();
        let think_time = chain.add_literal(think_time_literal(self.think_time));
        let lines = line_ranges(chain.script());

        // The fragment covering everything after the last cut.
        let mut tail = Some(chain.head());
        let mut next_entry = 0;

        for (index, line) in lines.iter().enumerate() {
            let row = index + 1;
            let Some(tail_id) = tail else { break };

            if is_think_time(chain.script_bytes(line)) {
                let span = chain.split(tail_id, line.clone())?;
                chain.bind_literal(span, think_time)?;
                tail = chain.next(span);
                report.think_time_lines += 1;
                continue;
            }

            while let Some(entry) = self.entries.get(next_entry).filter(|e| e.line_no < row) {
                report.report(UserError::LinePassed {
                    entry: entry.text().to_string(),
                    line_no: entry.line_no,
                    script: self.script_name.clone(),
                });
                next_entry += 1;
            }

            let mut candidates = Vec::new();
            while let Some(entry) = self.entries.get(next_entry).filter(|e| e.line_no == row) {
                let found = self.find_candidates(chain.script(), line, next_entry);
                if found.is_empty() {
                    report.report(UserError::NoMatch {
                        entry: entry.text().to_string(),
                        script: self.script_name.clone(),
                    });
                }
                candidates.extend(found);
                next_entry += 1;
            }
            if !candidates.is_empty() {
                tail = self.resolve_line(chain, tail_id, candidates, &mut report)?;
            }
        }

        for entry in &self.entries[next_entry..] {
            report.report(UserError::BeyondEnd {
                entry: entry.text().to_string(),
                line_no: entry.line_no,
                script: self.script_name.clone(),
            });
        }

        debug!(
            "Assembled {} fragments: {} substitutions, {} think-time lines",
            chain.len(),
            report.substitutions,
            report.think_time_lines
        );
        Ok(report)
    }

    fn find_candidates(&self, script: &[u8], line: &Range<usize>, entry: usize) -> Vec<Candidate> {
        let text = &script[line.clone()];
        let text = text.strip_suffix(b"\n").unwrap_or(text);
        let Ok(pattern) = ExactPattern::compile(&self.entries[entry].pattern) else {
            return Vec::new();
        };
        pattern
            .find_all(text)
            .into_iter()
            .map(|offset| Candidate {
                start: line.start + offset,
                len: pattern.len(),
                entry,
            })
            .collect()
    }

    /// Apply one line's candidates. Returns the new tail fragment.
    fn resolve_line(
        &self,
        chain: &mut FragmentChain,
        tail_id: FragmentId,
        mut candidates: Vec<Candidate>,
        report: &mut AssemblyReport,
    ) -> Result<Option<FragmentId>, CloneError> {
        sort_by(&mut candidates, |a, b| {
            a.start
                .cmp(&b.start)
                .then(b.len.cmp(&a.len))
                .then(a.entry.cmp(&b.entry))
        });

        let mut tail = Some(tail_id);
        let mut settled = BTreeSet::new();
        for candidate in candidates {
            let Some(tail_id) = tail else { break };
            if settled.contains(&candidate.entry) || candidate.start < chain.span(tail_id).start {
                continue;
            }
            let entry = &self.entries[candidate.entry];
            let Some(file_id) = entry.file else {
                continue;
            };
            let file = self.data.get(file_id);
            let track = file.track().filter(|t| !t.is_empty());

            let Some(track) = track else {
                report.report(UserError::NoRows {
                    entry: entry.text().to_string(),
                    data_file: file.path().display().to_string(),
                });
                settled.insert(candidate.entry);
                continue;
            };
            let Some(column) = track.column_index(&entry.column) else {
                report.report(UserError::UnknownColumn {
                    entry: entry.text().to_string(),
                    columns: header_text(track, self.separator),
                    data_file: file.path().display().to_string(),
                });
                settled.insert(candidate.entry);
                continue;
            };

            let span = chain.split(tail_id, candidate.start..candidate.start + candidate.len)?;
            chain.bind_substitution(span, file_id, column)?;
            tail = chain.next(span);
            settled.insert(candidate.entry);
            report.substitutions += 1;
        }
        Ok(tail)
    }
}

fn header_text(track: &RowTrack, separator: &Separator) -> String {
    track
        .header()
        .map(|h| h.display_with(separator))
        .unwrap_or_default()
}
