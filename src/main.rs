//! Command-line interface for script-cloner
//!
//! # Usage Examples
//!
//! ```bash
//! # Clone scripts/login/login.msc for 20 users of 50 transactions
//! export PATH_HOME=/home/load PATH_EXT=msc
//! script-cloner login 4711 1 20 50 N 10 N
//!
//! # Same run, keeping spent rows in the data files
//! script-cloner login 4711 1 20 50 N 10 Y
//!
//! # Report required rows per data file only
//! script-cloner --count login 4711 1 20 50 N 10 N
//! ```

use clap::Parser;
use delimited_rows::Separator;
use loadtest_clone::CloneLayout;
use script_cloner::{CloneConfig, RunSummary};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "script-cloner")]
#[command(about = "Clone a seed load-test script into one script per user")]
#[command(long_about = None)]
struct Cli {
    /// Base directory holding scripts/ and data/
    #[arg(long, env = "PATH_HOME")]
    path_home: PathBuf,

    /// File extension of seed scripts
    #[arg(long, env = "PATH_EXT")]
    path_ext: String,

    /// Only report how many rows each data file must supply
    #[arg(short, long)]
    count: bool,

    /// Field separator for data and definition files
    #[arg(long, default_value = "|")]
    separator: Separator,

    /// Directory the output scripts are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Name of the seed script (its directory under $PATH_HOME/scripts)
    script: String,

    /// Run identifier
    pid: String,

    /// Bundle
    bundle: String,

    /// Number of users
    #[arg(value_parser = parse_positive)]
    users: usize,

    /// Number of transactions each user does
    #[arg(value_parser = parse_positive)]
    transactions: usize,

    /// Whether variable length substitutions are allowed (Y/N, ignored)
    #[arg(value_parser = parse_yes_no, action = clap::ArgAction::Set)]
    variable_length: bool,

    /// Think time in seconds
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    think_time: u32,

    /// Whether data values can be reused (Y/N)
    #[arg(value_parser = parse_yes_no, action = clap::ArgAction::Set)]
    reuse: bool,
}

impl Cli {
    fn into_config(self) -> CloneConfig {
        CloneConfig {
            layout: CloneLayout::new(self.path_home, self.path_ext),
            script: self.script,
            pid: self.pid,
            bundle: self.bundle,
            users: self.users,
            transactions: self.transactions,
            variable_length: self.variable_length,
            think_time: self.think_time,
            reuse: self.reuse,
            count_only: self.count,
            separator: self.separator,
            output_dir: self.output_dir,
        }
    }
}

fn parse_positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("must be a whole number of at least 1, got '{value}'")),
    }
}

/// Accepts anything starting with Y, y, N or n.
fn parse_yes_no(value: &str) -> Result<bool, String> {
    match value.chars().next() {
        Some('Y' | 'y') => Ok(true),
        Some('N' | 'n') => Ok(false),
        _ => Err(format!("must be Y or N (or y or n), got '{value}'")),
    }
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing; user errors are warnings, so show them by default
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.into_config();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match script_cloner::run(&config, &mut out)? {
        RunSummary::Counted { files } => {
            tracing::debug!("Reported row counts for {files} data files");
        }
        RunSummary::Cloned { metrics, tidy, .. } => {
            if metrics.files_skipped > 0 || tidy.failures > 0 {
                tracing::warn!(
                    "{} output scripts and {} data files could not be written",
                    metrics.files_skipped,
                    tidy.failures
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from([
            "script-cloner",
            "--path-home",
            "/home/load",
            "--path-ext",
            "msc",
            "-c",
            "--separator",
            "::",
            "login",
            "4711",
            "b",
            "3",
            "4",
            "no",
            "10",
            "Yes",
        ])
        .unwrap();
        let config = cli.into_config();

        assert!(config.count_only);
        assert_eq!(config.users, 3);
        assert_eq!(config.transactions, 4);
        assert!(!config.variable_length);
        assert!(config.reuse);
        assert_eq!(config.think_time, 10);
        assert_eq!(config.separator, Separator::new("::").unwrap());
        assert_eq!(
            config.layout.script_path("login"),
            PathBuf::from("/home/load/scripts/login/login.msc")
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let base = ["script-cloner", "--path-home", "/h", "--path-ext", "e", "s", "p", "b"];
        let with = |rest: [&str; 5]| Cli::try_parse_from(base.iter().chain(rest.iter()));

        assert!(with(["1", "1", "N", "1", "N"]).is_ok());
        assert!(with(["0", "1", "N", "1", "N"]).is_err());
        assert!(with(["1", "x", "N", "1", "N"]).is_err());
        assert!(with(["1", "1", "maybe", "1", "N"]).is_err());
        assert!(with(["1", "1", "N", "0", "N"]).is_err());
        assert!(with(["1", "1", "N", "1", ""]).is_err());
    }

    #[test]
    fn test_yes_no_parser() {
        assert_eq!(parse_yes_no("y"), Ok(true));
        assert_eq!(parse_yes_no("N"), Ok(false));
        assert!(parse_yes_no("").is_err());
        assert!(parse_positive("-1").is_err());
    }
}
