//! The pieces of one clone run, held together.

use crate::assemble::{Assembly, AssemblyReport};
use crate::context::FileContext;
use crate::definition::DefinitionSet;
use crate::error::CloneError;
use crate::generate::{CloneMetrics, CloneRun};
use crate::tidy::{tidy_data_files, TidyReport};
use crate::tracker::DataFileTracker;
use delimited_rows::Separator;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where scripts, definitions and data files live under the base directory.
#[derive(Debug, Clone)]
pub struct CloneLayout {
    base: PathBuf,
    ext: String,
}

impl CloneLayout {
    pub fn new(base: impl Into<PathBuf>, ext: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ext: ext.into(),
        }
    }

    /// `{base}/scripts/{name}/{name}.{ext}`
    pub fn script_path(&self, name: &str) -> PathBuf {
        self.base
            .join("scripts")
            .join(name)
            .join(format!("{name}.{}", self.ext))
    }

    /// `{base}/scripts/{name}/{name}.def`
    pub fn definition_path(&self, name: &str) -> PathBuf {
        self.base
            .join("scripts")
            .join(name)
            .join(format!("{name}.def"))
    }

    /// `{base}/data/{name}.db`
    pub fn data_path(&self, name: &str) -> PathBuf {
        self.base.join("data").join(format!("{name}.db"))
    }
}

/// What to prepare.
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    /// Seed script name.
    pub script: String,
    pub separator: Separator,
    /// Users times transactions; scales every data file requirement.
    pub multiplier: usize,
    /// Accepted and kept, but substitutions are never length-checked.
    pub variable_length: bool,
    /// Skip reading data rows (count-only mode).
    pub count_only: bool,
}

/// Seed script, definitions and data files for one run.
#[derive(Debug)]
pub struct WriteControl {
    script: FileContext,
    definitions: Option<DefinitionSet>,
    data: DataFileTracker,
    separator: Separator,
    variable_length: bool,
}

impl WriteControl {
    /// Read the seed script and definitions, resolve data files and work out
    /// how many rows each must supply. Rows are loaded unless only counts
    /// are wanted.
    pub fn prepare(layout: &CloneLayout, options: &PrepareOptions) -> Result<Self, CloneError> {
        let script = FileContext::load_script(layout.script_path(&options.script))?;
        let mut definitions =
            DefinitionSet::load(&layout.definition_path(&options.script), &options.separator)?;

        let mut data = DataFileTracker::new();
        if let Some(definitions) = definitions.as_mut() {
            for entry in definitions.entries_mut() {
                let path = layout.data_path(&entry.data_file);
                entry.file = Some(data.resolve(path, &entry.disposition));
            }
            data.scale(options.multiplier);
            if !options.count_only {
                let rows = data.load_all(&options.separator);
                info!("Loaded {} rows from {} data files", rows, data.len());
            }
        }

        Ok(Self {
            script,
            definitions,
            data,
            separator: options.separator.clone(),
            variable_length: options.variable_length,
        })
    }

    /// Each data file with the number of rows it must supply.
    pub fn requirements(&self) -> Vec<(&Path, usize)> {
        self.data.requirements()
    }

    /// Build the write instructions for the script.
    pub fn assemble(&mut self, think_time: u32) -> Result<AssemblyReport, CloneError> {
        let assembly = Assembly {
            script_name: self.script.path().display().to_string(),
            entries: self
                .definitions
                .as_ref()
                .map(DefinitionSet::entries)
                .unwrap_or_default(),
            data: &self.data,
            separator: &self.separator,
            think_time,
        };
        let chain = self
            .script
            .chain_mut()
            .ok_or_else(|| CloneError::Fragment("script context holds rows".to_string()))?;
        assembly.run(chain)
    }

    /// Write every output script.
    pub fn generate(&mut self, run: &CloneRun) -> Result<CloneMetrics, CloneError> {
        let chain = self
            .script
            .chain()
            .ok_or_else(|| CloneError::Fragment("script context holds rows".to_string()))?;
        Ok(run.generate(chain, &mut self.data))
    }

    /// Record spent rows and rewrite the data files.
    pub fn tidy(&mut self, reuse: bool) -> TidyReport {
        tidy_data_files(&mut self.data, reuse)
    }

    pub fn script(&self) -> &FileContext {
        &self.script
    }

    pub fn definitions(&self) -> Option<&DefinitionSet> {
        self.definitions.as_ref()
    }

    pub fn data(&self) -> &DataFileTracker {
        &self.data
    }

    pub fn variable_length(&self) -> bool {
        self.variable_length
    }
}
