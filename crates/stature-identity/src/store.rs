//! Record stores
//!
//! A store is owned by exactly one writer. Reads see every write made
//! through the same store value. Nothing here locks the underlying file, so
//! two processes sharing a file will lose updates.

use std::fs::{self, File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stature_core::{StatureError, StatureResult};
use tracing::debug;

use crate::{read_records, write_records, IdentityRecord};

/// Persistent table of identity records
pub trait RecordStore {
    /// All records in row order. A store that was never written is empty.
    fn load(&self) -> StatureResult<Vec<IdentityRecord>>;

    /// Replace the row with the same id, or add it at the end
    fn upsert(&mut self, record: IdentityRecord) -> StatureResult<()>;

    /// Add a row at the end without looking at existing rows
    fn append(&mut self, record: IdentityRecord) -> StatureResult<()>;

    /// The first row with this id
    fn find(&self, id: &str) -> StatureResult<Option<IdentityRecord>> {
        Ok(self.load()?.into_iter().find(|r| r.id == id))
    }

    /// Number of rows
    fn len(&self) -> StatureResult<usize> {
        Ok(self.load()?.len())
    }

    fn is_empty(&self) -> StatureResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// In-memory store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Vec<IdentityRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<IdentityRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[IdentityRecord] {
        &self.records
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> StatureResult<Vec<IdentityRecord>> {
        Ok(self.records.clone())
    }

    fn upsert(&mut self, record: IdentityRecord) -> StatureResult<()> {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        Ok(())
    }

    fn append(&mut self, record: IdentityRecord) -> StatureResult<()> {
        self.records.push(record);
        Ok(())
    }
}

/// Store backed by a semicolon-delimited file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Rewrite the whole file through a staging file and a rename
    fn rewrite(&self, records: &[IdentityRecord]) -> StatureResult<()> {
        let staging = self.staging_path();
        write_records(File::create(&staging)?, records)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn load(&self) -> StatureResult<Vec<IdentityRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StatureError::Io(e)),
        };
        read_records(BufReader::new(file))
    }

    fn upsert(&mut self, record: IdentityRecord) -> StatureResult<()> {
        let mut records = self.load()?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        debug!(path = %self.path.display(), rows = records.len(), "rewriting store");
        self.rewrite(&records)
    }

    fn append(&mut self, record: IdentityRecord) -> StatureResult<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write_records(file, std::slice::from_ref(&record))
    }
}

/// Where the two stores live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding both files
    pub directory: PathBuf,
    /// Per-session running averages
    pub unknown_file: String,
    /// Enrolled subjects
    pub known_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            unknown_file: "unknownPeople.csv".to_string(),
            known_file: "knownPeople.csv".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    pub fn unknown_path(&self) -> PathBuf {
        self.directory.join(&self.unknown_file)
    }

    pub fn known_path(&self) -> PathBuf {
        self.directory.join(&self.known_file)
    }

    pub fn validate(&self) -> StatureResult<()> {
        if self.unknown_file.is_empty() || self.known_file.is_empty() {
            return Err(StatureError::InvalidConfig(
                "store file names must not be empty".into(),
            ));
        }
        if self.unknown_file == self.known_file {
            return Err(StatureError::InvalidConfig(
                "unknown and known stores must be different files".into(),
            ));
        }
        Ok(())
    }

    /// Open (unknown, known) file stores
    pub fn open(&self) -> (FileStore, FileStore) {
        (
            FileStore::new(self.unknown_path()),
            FileStore::new(self.known_path()),
        )
    }
}
