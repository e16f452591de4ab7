//! Where the frequency table and new observations come from, and where merges go.
//!
//! The estimator only ever sees a loaded [FrequencyTable]; this module is the I/O shell
//! around it. Merging is a separate, caller-gated step.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::data::frequency::{parse_observations, FrequencyTable, Observation};
use crate::error::{AreaDamageError, Result};

pub const DEFAULT_TABLE_PATH: &str = "data/total.txt";
pub const DEFAULT_OBSERVATIONS_PATH: &str = "data/observations.txt";
pub const DEFAULT_BACKUP_PATH: &str = "data/backup.txt";

pub trait FrequencySource {
    fn load_frequency_table(&self) -> Result<FrequencyTable>;

    fn load_observations(&self) -> Result<Vec<Observation>>;

    /// Merge `observations` into `table`, persist the result and return it.
    fn merge_and_persist(
        &self,
        table: &FrequencyTable,
        observations: &[Observation],
    ) -> Result<FrequencyTable>;
}

/// Text files on disk: the tab-separated table, the observation pairs and a backup copy
/// of the table written before every overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFrequencyStore {
    pub table_path: PathBuf,
    pub observations_path: PathBuf,
    pub backup_path: PathBuf,
}

impl Default for FileFrequencyStore {
    fn default() -> Self {
        Self::new(
            DEFAULT_TABLE_PATH,
            DEFAULT_OBSERVATIONS_PATH,
            DEFAULT_BACKUP_PATH,
        )
    }
}

impl FileFrequencyStore {
    pub fn new(
        table_path: impl Into<PathBuf>,
        observations_path: impl Into<PathBuf>,
        backup_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            table_path: table_path.into(),
            observations_path: observations_path.into(),
            backup_path: backup_path.into(),
        }
    }

    fn backup_existing_table(&self) -> Result<()> {
        if !self.table_path.is_file() {
            warn!(
                "no existing table at {}; skipping backup",
                self.table_path.display()
            );
            return Ok(());
        }
        ensure_parent(&self.backup_path)?;
        fs::copy(&self.table_path, &self.backup_path).map_err(|source| {
            AreaDamageError::Persist {
                path: self.backup_path.clone(),
                source,
            }
        })?;
        Ok(())
    }
}

impl FrequencySource for FileFrequencyStore {
    fn load_frequency_table(&self) -> Result<FrequencyTable> {
        let raw = read_file(&self.table_path)?;
        FrequencyTable::parse_tsv(&raw, &self.table_path)
    }

    fn load_observations(&self) -> Result<Vec<Observation>> {
        let raw = read_file(&self.observations_path)?;
        parse_observations(&raw, &self.observations_path)
    }

    fn merge_and_persist(
        &self,
        table: &FrequencyTable,
        observations: &[Observation],
    ) -> Result<FrequencyTable> {
        let mut merged = table.clone();
        merged.merge(observations)?;
        self.backup_existing_table()?;
        ensure_parent(&self.table_path)?;
        let persist = |source: io::Error| AreaDamageError::Persist {
            path: self.table_path.clone(),
            source,
        };
        let rendered = merged.to_tsv().map_err(persist)?;
        fs::write(&self.table_path, rendered).map_err(persist)?;
        info!(
            "merged {} observation(s) into {} (total now {})",
            observations.len(),
            self.table_path.display(),
            merged.total()
        );
        Ok(merged)
    }
}

/// In-memory provider for tests and embedding; `merge_and_persist` updates the held table.
#[derive(Debug, Default)]
pub struct MemoryFrequencyStore {
    table: RefCell<FrequencyTable>,
    observations: Vec<Observation>,
}

impl MemoryFrequencyStore {
    pub fn new(table: FrequencyTable, observations: Vec<Observation>) -> Self {
        Self {
            table: RefCell::new(table),
            observations,
        }
    }

    pub fn table(&self) -> FrequencyTable {
        self.table.borrow().clone()
    }
}

impl FrequencySource for MemoryFrequencyStore {
    fn load_frequency_table(&self) -> Result<FrequencyTable> {
        Ok(self.table())
    }

    fn load_observations(&self) -> Result<Vec<Observation>> {
        Ok(self.observations.clone())
    }

    fn merge_and_persist(
        &self,
        table: &FrequencyTable,
        observations: &[Observation],
    ) -> Result<FrequencyTable> {
        let mut merged = table.clone();
        merged.merge(observations)?;
        *self.table.borrow_mut() = merged.clone();
        Ok(merged)
    }
}

/// Load the table and, when `merge` is set, fold in pending observations first.
pub fn load_for_estimate<S: FrequencySource + ?Sized>(
    source: &S,
    merge: bool,
) -> Result<FrequencyTable> {
    let table = source.load_frequency_table()?;
    if !merge {
        return Ok(table);
    }
    let observations = source.load_observations()?;
    source.merge_and_persist(&table, &observations)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| AreaDamageError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| AreaDamageError::Persist {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
