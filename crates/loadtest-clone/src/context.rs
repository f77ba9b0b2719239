//! File contexts: one input file and what was read from it.

use crate::error::CloneError;
use crate::piece::FragmentChain;
use delimited_rows::{RecordReader, RowTrack, Separator};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Open reader left positioned after the last loaded row of a data file.
pub type RowSource = RecordReader<BufReader<File>>;

/// What a file context holds.
#[derive(Debug)]
pub enum FileContent {
    /// Rows of a delimited data file. `source` stays open until the file is
    /// rewritten so the unread remainder can be copied across.
    Rows {
        track: RowTrack,
        source: Option<RowSource>,
    },
    /// A seed script broken into fragments.
    Pieces(FragmentChain),
}

/// One input file.
#[derive(Debug)]
pub struct FileContext {
    path: PathBuf,
    content: FileContent,
}

impl FileContext {
    /// A data file context that has not been loaded yet.
    pub fn rows(path: PathBuf, track: RowTrack) -> Self {
        Self {
            path,
            content: FileContent::Rows {
                track,
                source: None,
            },
        }
    }

    /// A script file context.
    pub fn pieces(path: PathBuf, chain: FragmentChain) -> Self {
        Self {
            path,
            content: FileContent::Pieces(chain),
        }
    }

    /// Read a seed script into a single-fragment chain.
    pub fn load_script(path: PathBuf) -> Result<Self, CloneError> {
        let metadata = std::fs::metadata(&path).map_err(|source| CloneError::Script {
            path: path.clone(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(CloneError::NotRegularFile(path));
        }
        let bytes = std::fs::read(&path).map_err(|source| CloneError::Script {
            path: path.clone(),
            source,
        })?;
        debug!("Read script {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::pieces(path, FragmentChain::new(bytes)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &FileContent {
        &self.content
    }

    /// Row collection, for data file contexts.
    pub fn track(&self) -> Option<&RowTrack> {
        match &self.content {
            FileContent::Rows { track, .. } => Some(track),
            FileContent::Pieces(_) => None,
        }
    }

    pub fn track_mut(&mut self) -> Option<&mut RowTrack> {
        match &mut self.content {
            FileContent::Rows { track, .. } => Some(track),
            FileContent::Pieces(_) => None,
        }
    }

    /// Fragment chain, for script contexts.
    pub fn chain(&self) -> Option<&FragmentChain> {
        match &self.content {
            FileContent::Pieces(chain) => Some(chain),
            FileContent::Rows { .. } => None,
        }
    }

    pub fn chain_mut(&mut self) -> Option<&mut FragmentChain> {
        match &mut self.content {
            FileContent::Pieces(chain) => Some(chain),
            FileContent::Rows { .. } => None,
        }
    }

    /// Value of `column` in the row under the cursor.
    pub fn current_field(&self, column: usize) -> Option<&[u8]> {
        self.track()?.current_row()?.field(column)
    }

    /// Open the data file, read its header and as many rows as requested.
    ///
    /// The reader is kept open afterwards. Returns the number of rows loaded.
    pub fn load_rows(&mut self, separator: &Separator) -> Result<usize, CloneError> {
        let FileContent::Rows { track, source } = &mut self.content else {
            return Ok(0);
        };
        let file = File::open(&self.path)?;
        let mut reader = RecordReader::new(BufReader::new(file), separator.clone());
        if !track.read_header(&mut reader)? {
            debug!("Data file {} is empty", self.path.display());
            return Ok(0);
        }
        let loaded = track.bulk_load(&mut reader)?;
        *source = Some(reader);
        Ok(loaded)
    }

    /// Give up the open reader, if any.
    pub fn take_source(&mut self) -> Option<RowSource> {
        match &mut self.content {
            FileContent::Rows { source, .. } => source.take(),
            FileContent::Pieces(_) => None,
        }
    }
}
