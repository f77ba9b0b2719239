//! Shared base-directory fixture.

use delimited_rows::Separator;
use loadtest_clone::CloneLayout;
use script_cloner::{run, CloneConfig, RunSummary};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SCRIPT: &str = "seed";
pub const EXT: &str = "msc";

/// A base directory plus an output directory, both temporary.
pub struct Fixture {
    pub base: TempDir,
    pub output: TempDir,
}

impl Fixture {
    pub fn new(script: &str) -> Self {
        let base = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let script_dir = base.path().join("scripts").join(SCRIPT);
        std::fs::create_dir_all(&script_dir).unwrap();
        std::fs::create_dir_all(base.path().join("data")).unwrap();
        std::fs::write(script_dir.join(format!("{SCRIPT}.{EXT}")), script).unwrap();
        Self { base, output }
    }

    pub fn definitions(self, text: &str) -> Self {
        let path = self
            .base
            .path()
            .join("scripts")
            .join(SCRIPT)
            .join(format!("{SCRIPT}.def"));
        std::fs::write(path, text).unwrap();
        self
    }

    pub fn data(self, name: &str, text: &str) -> Self {
        std::fs::write(self.data_path(name), text).unwrap();
        self
    }

    pub fn data_path(&self, name: &str) -> PathBuf {
        self.base.path().join("data").join(format!("{name}.db"))
    }

    pub fn read_data(&self, name: &str) -> String {
        std::fs::read_to_string(self.data_path(name)).unwrap()
    }

    pub fn read_spent(&self, name: &str) -> Option<String> {
        let mut path = self.data_path(name).into_os_string();
        path.push(".spent");
        std::fs::read_to_string(path).ok()
    }

    pub fn output_path(&self, pid: &str, bundle: &str, user: usize) -> PathBuf {
        self.output
            .path()
            .join(format!("echo{pid}.{bundle}.{user}"))
    }

    pub fn read_output(&self, user: usize) -> String {
        std::fs::read_to_string(self.output_path("77", "1", user)).unwrap()
    }

    pub fn config(&self, users: usize, transactions: usize) -> CloneConfig {
        CloneConfig {
            layout: CloneLayout::new(self.base.path(), EXT),
            script: SCRIPT.to_string(),
            pid: "77".to_string(),
            bundle: "1".to_string(),
            users,
            transactions,
            variable_length: false,
            think_time: 30,
            reuse: false,
            count_only: false,
            separator: Separator::default(),
            output_dir: self.output.path().to_path_buf(),
        }
    }

    /// Run with `config`, returning the summary and anything printed.
    pub fn run(&self, config: &CloneConfig) -> (RunSummary, String) {
        let mut printed = Vec::new();
        let summary = run(config, &mut printed).unwrap();
        (summary, String::from_utf8(printed).unwrap())
    }

    pub fn output_files(&self) -> usize {
        count_entries(self.output.path())
    }
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
