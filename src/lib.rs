//! script-cloner library
//!
//! Clones a seed load-test script into one output script per simulated user.
//! Tokens named in the script's definition file are replaced with values taken
//! round-robin from delimited data files, and the rows used are then moved out
//! of the data files so the next run starts on fresh data.
//!
//! # Layout
//!
//! Under the base directory (`PATH_HOME`):
//!
//! - `scripts/{name}/{name}.{ext}`: the seed script (`ext` is `PATH_EXT`)
//! - `scripts/{name}/{name}.def`: its definition file, optional
//! - `data/{file}.db`: data files named by the definition file
//!
//! # CLI Usage
//!
//! ```bash
//! # 20 users, 50 transactions each, 10 second think time, no data reuse
//! PATH_HOME=/home/load PATH_EXT=msc script-cloner login 4711 1 20 50 N 10 N
//!
//! # How many rows each data file must supply for that run
//! script-cloner -c login 4711 1 20 50 N 10 N
//! ```

use anyhow::Context;
use delimited_rows::Separator;
use loadtest_clone::{
    AssemblyReport, CloneLayout, CloneMetrics, CloneRun, PrepareOptions, TidyReport, WriteControl,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Everything one invocation needs.
#[derive(Debug, Clone)]
pub struct CloneConfig {
    pub layout: CloneLayout,
    /// Seed script name.
    pub script: String,
    /// Run identifier used in output names.
    pub pid: String,
    pub bundle: String,
    pub users: usize,
    pub transactions: usize,
    /// Recorded only; substitutions may always change the line length.
    pub variable_length: bool,
    /// Think time in seconds.
    pub think_time: u32,
    /// Put spent rows back at the end of each data file.
    pub reuse: bool,
    /// Report row requirements instead of cloning.
    pub count_only: bool,
    pub separator: Separator,
    pub output_dir: PathBuf,
}

/// What a run did.
#[derive(Debug)]
pub enum RunSummary {
    /// Count-only mode: number of data files reported.
    Counted { files: usize },
    /// Scripts were cloned and data files tidied.
    Cloned {
        assembly: AssemblyReport,
        metrics: CloneMetrics,
        tidy: TidyReport,
    },
}

/// Execute one invocation. The count-only report goes to `out`.
pub fn run<W: Write>(config: &CloneConfig, out: &mut W) -> anyhow::Result<RunSummary> {
    let multiplier = config
        .users
        .checked_mul(config.transactions)
        .context("Number of users times transactions is too large")?;
    let options = PrepareOptions {
        script: config.script.clone(),
        separator: config.separator.clone(),
        multiplier,
        variable_length: config.variable_length,
        count_only: config.count_only,
    };
    let mut control = WriteControl::prepare(&config.layout, &options)
        .with_context(|| format!("Failed to prepare seed script '{}'", config.script))?;

    if config.count_only {
        let requirements = control.requirements();
        for (path, count) in &requirements {
            writeln!(out, "{}{}{}", path.display(), config.separator, count)
                .context("Failed to write row counts")?;
        }
        out.flush().context("Failed to write row counts")?;
        return Ok(RunSummary::Counted {
            files: requirements.len(),
        });
    }

    let assembly = control
        .assemble(config.think_time)
        .with_context(|| format!("Failed to assemble seed script '{}'", config.script))?;
    info!(
        "Script {} assembled: {} substitutions, {} think-time lines, {} user errors",
        control.script().path().display(),
        assembly.substitutions,
        assembly.think_time_lines,
        assembly.errors.len()
    );

    let clone_run = CloneRun {
        pid: config.pid.clone(),
        bundle: config.bundle.clone(),
        users: config.users,
        transactions: config.transactions,
        output_dir: config.output_dir.clone(),
    };
    let metrics = control.generate(&clone_run)?;
    let tidy = control.tidy(config.reuse);

    Ok(RunSummary::Cloned {
        assembly,
        metrics,
        tidy,
    })
}
