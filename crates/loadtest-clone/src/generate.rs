//! Writing cloned scripts.

use crate::piece::{FragmentChain, FragmentKind};
use crate::tracker::DataFileTracker;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default buffer size for output scripts.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Metrics from a clone run.
#[derive(Debug, Clone, Default)]
pub struct CloneMetrics {
    /// Output scripts written in full.
    pub files_written: u64,
    /// Output scripts that could not be opened or finished.
    pub files_skipped: u64,
    /// Transactions written across all scripts.
    pub transactions: u64,
    /// Bytes written across all scripts.
    pub bytes_written: u64,
    /// Total time taken.
    pub total_duration: Duration,
}

impl CloneMetrics {
    /// Calculate bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.bytes_written as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Calculate transactions per second.
    pub fn transactions_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.transactions as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// One batch of output scripts.
#[derive(Debug, Clone)]
pub struct CloneRun {
    /// Run identifier.
    pub pid: String,
    pub bundle: String,
    /// Number of output scripts.
    pub users: usize,
    /// Transactions in each output script.
    pub transactions: usize,
    pub output_dir: PathBuf,
}

impl CloneRun {
    /// Path of the script for user `user` (counting from zero).
    pub fn output_path(&self, user: usize) -> PathBuf {
        self.output_dir
            .join(format!("echo{}.{}.{}", self.pid, self.bundle, user))
    }

    /// Write every user's script from `chain`.
    ///
    /// After each transaction every data file moves on one row, so every
    /// transaction in the run sees the next row of each file. A script that
    /// cannot be opened is reported and skipped without using any rows.
    pub fn generate(&self, chain: &FragmentChain, data: &mut DataFileTracker) -> CloneMetrics {
        let start_time = Instant::now();
        let mut metrics = CloneMetrics::default();

        info!(
            "Writing {} scripts of {} transactions to {}",
            self.users,
            self.transactions,
            self.output_dir.display()
        );

        for user in 0..self.users {
            let path = self.output_path(user);
            let file = match File::create(&path) {
                Ok(file) => file,
                Err(e) => {
                    warn!("Failed to open {} for write: {}", path.display(), e);
                    metrics.files_skipped += 1;
                    continue;
                }
            };
            let mut out = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);

            let mut failed = false;
            for _ in 0..self.transactions {
                match write_transaction(chain, data, &mut out) {
                    Ok(bytes) => metrics.bytes_written += bytes,
                    Err(e) => {
                        warn!("Failed writing {}: {}", path.display(), e);
                        failed = true;
                        break;
                    }
                }
                data.advance_all();
                metrics.transactions += 1;
            }
            if let Err(e) = out.flush() {
                warn!("Failed writing {}: {}", path.display(), e);
                failed = true;
            }

            if failed {
                metrics.files_skipped += 1;
            } else {
                metrics.files_written += 1;
                debug!("Wrote {}", path.display());
            }
        }

        metrics.total_duration = start_time.elapsed();
        info!(
            "Clone complete: {} scripts, {} transactions, {} bytes in {:?} ({:.2} bytes/sec)",
            metrics.files_written,
            metrics.transactions,
            metrics.bytes_written,
            metrics.total_duration,
            metrics.bytes_per_second()
        );
        metrics
    }
}

/// Write one pass over the chain. Returns the number of bytes written.
pub fn write_transaction<W: Write>(
    chain: &FragmentChain,
    data: &DataFileTracker,
    out: &mut W,
) -> std::io::Result<u64> {
    let mut written = 0;
    for (_, fragment) in chain.iter() {
        let bytes = match &fragment.kind {
            FragmentKind::Script(range) => chain.script_bytes(range),
            FragmentKind::Literal { literal, .. } => chain.literal(*literal),
            FragmentKind::Substitution { file, column, .. } => {
                data.get(*file).current_field(*column).unwrap_or_default()
            }
        };
        out.write_all(bytes)?;
        written += bytes.len() as u64;
    }
    Ok(written)
}
