//! Data files referenced by definition entries.

use crate::context::FileContext;
use crate::definition::Disposition;
use delimited_rows::{RowTrack, Separator};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Handle of a data file in its tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataFileId(usize);

impl DataFileId {
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Every data file in use, in the order they were first referenced.
///
/// The number of rows each file must supply starts at one and grows by one
/// for every further `F` entry naming the same file.
#[derive(Debug, Default)]
pub struct DataFileTracker {
    files: Vec<FileContext>,
}

impl DataFileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or add the data file at `path`.
    pub fn resolve(&mut self, path: PathBuf, disposition: &Disposition) -> DataFileId {
        if let Some(index) = self.files.iter().position(|f| f.path() == path) {
            if *disposition == Disposition::Fresh {
                if let Some(track) = self.files[index].track_mut() {
                    track.add_requested(1);
                }
            }
            return DataFileId(index);
        }
        debug!("Tracking data file {}", path.display());
        self.files.push(FileContext::rows(path, RowTrack::new(1)));
        DataFileId(self.files.len() - 1)
    }

    /// Multiply every file's requirement, once per user and transaction.
    pub fn scale(&mut self, factor: usize) {
        for track in self.files.iter_mut().filter_map(FileContext::track_mut) {
            track.scale_requested(factor);
        }
    }

    /// Load the required rows of every file.
    ///
    /// A file that cannot be read is reported and left without rows. Returns
    /// the total number of rows loaded.
    pub fn load_all(&mut self, separator: &Separator) -> usize {
        let mut total = 0;
        for file in &mut self.files {
            match file.load_rows(separator) {
                Ok(loaded) => {
                    let requested = file.track().map_or(0, RowTrack::requested);
                    if loaded < requested {
                        warn!(
                            "Data file {} supplied {} of {} rows; values will repeat",
                            file.path().display(),
                            loaded,
                            requested
                        );
                    }
                    total += loaded;
                }
                Err(e) => warn!("Data file {} could not be read: {}", file.path().display(), e),
            }
        }
        total
    }

    /// Move every file's cursor on by one row.
    pub fn advance_all(&mut self) {
        for track in self.files.iter_mut().filter_map(FileContext::track_mut) {
            track.advance();
        }
    }

    /// Each file with the number of rows it must supply.
    pub fn requirements(&self) -> Vec<(&Path, usize)> {
        self.files
            .iter()
            .map(|f| (f.path(), f.track().map_or(0, RowTrack::requested)))
            .collect()
    }

    pub fn get(&self, id: DataFileId) -> &FileContext {
        &self.files[id.0]
    }

    pub fn get_mut(&mut self, id: DataFileId) -> &mut FileContext {
        &mut self.files[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileContext> {
        self.files.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FileContext> {
        self.files.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
