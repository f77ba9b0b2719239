//! Seed script cloning for load tests.
//!
//! One seed script is turned into many output scripts. Lines named in a
//! definition file have their matched tokens replaced by values taken
//! round-robin from delimited data files; think-time lines get the run's
//! think time. Afterwards the rows that were used are moved to `.spent`
//! files so the next run starts on fresh data.
//!
//! # Example
//!
//! ```ignore
//! use loadtest_clone::{CloneLayout, CloneRun, PrepareOptions, WriteControl};
//!
//! let layout = CloneLayout::new("/home/load", "msc");
//! let mut control = WriteControl::prepare(&layout, &options)?;
//! control.assemble(10)?;
//! let metrics = control.generate(&run)?;
//! control.tidy(false);
//! ```

pub mod assemble;
pub mod context;
pub mod control;
pub mod definition;
mod error;
pub mod generate;
pub mod pattern;
pub mod piece;
pub mod tidy;
pub mod tracker;

pub use assemble::{AssemblyReport, UserError};
pub use context::{FileContent, FileContext};
pub use control::{CloneLayout, PrepareOptions, WriteControl};
pub use definition::{DefinitionEntry, DefinitionSet, Disposition, DEFINITION_COLUMNS};
pub use error::CloneError;
pub use generate::{CloneMetrics, CloneRun};
pub use piece::{FragmentChain, FragmentId, FragmentKind};
pub use tidy::TidyReport;
pub use tracker::{DataFileId, DataFileTracker};
