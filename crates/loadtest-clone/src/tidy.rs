//! Rewriting data files after a run.
//!
//! Rows loaded for a run count as spent. For each data file they are appended
//! to `<file>.spent`, and the file is replaced by its header plus the rows that
//! were never loaded. With reuse on, the spent rows also go back onto the end
//! of the replacement file.

use crate::context::{FileContent, FileContext};
use crate::error::CloneError;
use crate::tracker::DataFileTracker;
use delimited_rows::Row;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of tidying every data file.
#[derive(Debug, Clone, Default)]
pub struct TidyReport {
    /// Data files replaced.
    pub files_rewritten: usize,
    /// Rows appended to spent files.
    pub rows_spent: u64,
    /// Data files that could not be rewritten.
    pub failures: usize,
}

/// `path` with `.suffix` appended to its file name.
pub fn companion_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Record spent rows and rewrite every data file that supplied any.
pub fn tidy_data_files(data: &mut DataFileTracker, reuse: bool) -> TidyReport {
    let mut report = TidyReport::default();
    for file in data.iter_mut() {
        match tidy_file(file, reuse) {
            Ok(0) => {}
            Ok(spent) => {
                report.files_rewritten += 1;
                report.rows_spent += spent as u64;
            }
            Err(e) => {
                warn!("Failed to rewrite data file {}: {}", file.path().display(), e);
                report.failures += 1;
            }
        }
    }
    info!(
        "Data files tidied: {} rewritten, {} rows spent, {} failed",
        report.files_rewritten, report.rows_spent, report.failures
    );
    report
}

/// Tidy one data file. Returns the number of spent rows, zero when the file
/// supplied nothing and was left alone.
fn tidy_file(file: &mut FileContext, reuse: bool) -> Result<usize, CloneError> {
    let path = file.path().to_path_buf();
    let source = file.take_source();
    let FileContent::Rows { track, .. } = file.content() else {
        return Ok(0);
    };
    if track.is_empty() {
        return Ok(0);
    }

    let spent_path = companion_path(&path, "spent");
    let mut spent = BufWriter::new(
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&spent_path)?,
    );
    write_rows(&mut spent, track.rows())?;
    spent.flush()?;
    drop(spent);

    let mut remainder = Vec::new();
    if let Some(mut reader) = source {
        reader.get_mut().read_to_end(&mut remainder)?;
    }

    let new_path = companion_path(&path, "new");
    let mut out = BufWriter::new(File::create(&new_path)?);
    if let Some(header) = track.header() {
        write_line(&mut out, header.line())?;
    }
    if reuse {
        if !remainder.is_empty() {
            write_line(&mut out, &remainder)?;
        }
        write_rows(&mut out, track.rows())?;
    } else {
        out.write_all(&remainder)?;
    }
    out.flush()?;
    drop(out);

    replace_file(&new_path, &path)?;
    debug!(
        "Rewrote {} with {} rows spent",
        path.display(),
        track.len()
    );
    Ok(track.len())
}

fn write_rows<W: Write>(out: &mut W, rows: &[Row]) -> std::io::Result<()> {
    for row in rows {
        write_line(out, row.line())?;
    }
    Ok(())
}

/// Write `bytes`, adding a newline if they do not end with one.
fn write_line<W: Write>(out: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    out.write_all(bytes)?;
    if !bytes.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Move `from` over `to`, copying when a rename is not possible.
fn replace_file(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::remove_file(to)?;
    if let Err(e) = fs::rename(from, to) {
        debug!("Rename of {} failed ({}), copying instead", from.display(), e);
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}
