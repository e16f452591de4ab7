//! Scenario configuration: simulation parameters, the AD change being evaluated and the
//! data file locations. Loaded from YAML; every field falls back to the reference scenario.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::data::store::{
    FileFrequencyStore, DEFAULT_BACKUP_PATH, DEFAULT_OBSERVATIONS_PATH, DEFAULT_TABLE_PATH,
};
use crate::error::{AreaDamageError, Result};
use crate::parallel::WorkerPool;
use crate::sim::{AdChange, SampleConfig};

pub const DEFAULT_SCENARIO_PATH: &str = "data/scenario.yaml";
pub const CONFIG_ENV: &str = "AREADMG_CONFIG";
pub const WORKERS_ENV: &str = "AREADMG_WORKERS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    pub sample_size: usize,
    pub proc_chance: f64,
    pub proc_radius: f64,
    pub skill_radius: f64,
    pub target_radius: f64,
    pub old_ad_pct: f64,
    pub new_ad_pct: f64,
    /// Pinned seed; when absent one is drawn from OS entropy per run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Worker threads for the parallel estimator; 0 = all cores.
    pub workers: usize,
    pub data: DataPaths,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataPaths {
    pub table_path: PathBuf,
    pub observations_path: PathBuf,
    pub backup_path: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            table_path: PathBuf::from(DEFAULT_TABLE_PATH),
            observations_path: PathBuf::from(DEFAULT_OBSERVATIONS_PATH),
            backup_path: PathBuf::from(DEFAULT_BACKUP_PATH),
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            sample_size: 100_000,
            proc_chance: 0.2,
            proc_radius: 10.0,
            skill_radius: 10.0,
            target_radius: 1.0,
            old_ad_pct: 0.5,
            new_ad_pct: 0.7,
            seed: None,
            workers: 0,
            data: DataPaths::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            AreaDamageError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_yaml(&raw)
    }

    /// Explicit path, then `AREADMG_CONFIG`, then [DEFAULT_SCENARIO_PATH] if present,
    /// then built-in defaults. `AREADMG_WORKERS` overrides `workers` in every case.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let env_path = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_path(&path)?,
            None if Path::new(DEFAULT_SCENARIO_PATH).is_file() => {
                Self::from_path(Path::new(DEFAULT_SCENARIO_PATH))?
            }
            None => Self::default(),
        };
        if let Ok(raw) = env::var(WORKERS_ENV) {
            match raw.parse::<usize>() {
                Ok(workers) => config.workers = workers,
                Err(_) => warn!("invalid {WORKERS_ENV} '{raw}', keeping {}", config.workers),
            }
        }
        Ok(config)
    }

    pub fn sample_config(&self) -> Result<SampleConfig> {
        SampleConfig::new(
            self.sample_size,
            self.proc_chance,
            self.proc_radius,
            self.skill_radius,
            self.target_radius,
        )
    }

    pub fn ad_change(&self) -> Result<AdChange> {
        AdChange::new(self.old_ad_pct, self.new_ad_pct)
    }

    pub fn worker_pool(&self) -> WorkerPool {
        WorkerPool::with_workers(self.workers)
    }

    pub fn store(&self) -> FileFrequencyStore {
        FileFrequencyStore::new(
            &self.data.table_path,
            &self.data.observations_path,
            &self.data.backup_path,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_scenario() {
        let config = ScenarioConfig::default();
        let sample = config.sample_config().unwrap();
        assert_eq!(sample.sample_size(), 100_000);
        assert_eq!(sample.proc_chance(), 0.2);
        assert_eq!(sample.skill_radius(), 10.0);
        assert_eq!(config.ad_change().unwrap(), AdChange::new(0.5, 0.7).unwrap());
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_fields() {
        let raw = "sample_size: 500\nseed: 9\ndata:\n  table_path: t.txt\n";
        let config = ScenarioConfig::from_yaml(raw).unwrap();
        assert_eq!(config.sample_size, 500);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.proc_radius, 10.0);
        assert_eq!(config.data.table_path, PathBuf::from("t.txt"));
        assert_eq!(config.data.backup_path, PathBuf::from(DEFAULT_BACKUP_PATH));
    }

    #[test]
    fn malformed_yaml_is_config_parse_error() {
        let err = ScenarioConfig::from_yaml("sample_size: [").unwrap_err();
        assert!(matches!(err, AreaDamageError::ConfigParse(_)));
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        let err = ScenarioConfig::from_yaml("sampel_size: 500\n").unwrap_err();
        assert!(matches!(err, AreaDamageError::ConfigParse(_)));
        let err = ScenarioConfig::from_yaml("data:\n  tabel_path: t.txt\n").unwrap_err();
        assert!(matches!(err, AreaDamageError::ConfigParse(_)));
    }

    #[test]
    fn invalid_values_surface_from_sample_config() {
        let config = ScenarioConfig {
            target_radius: 20.0,
            ..ScenarioConfig::default()
        };
        assert!(config.sample_config().is_err());
    }

    #[test]
    fn missing_explicit_file_is_config_error() {
        let err = ScenarioConfig::from_path(Path::new("no/such/scenario.yaml")).unwrap_err();
        assert!(matches!(err, AreaDamageError::Config(_)));
    }
}
