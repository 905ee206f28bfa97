use std::{collections::HashMap, path::PathBuf, time::Duration};

use config::{Config as ConfigLib, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::dsl::Period;
use crate::issuer::{DEFAULT_DISTRIBUTION_POINT, SchedulerConfig};
use crate::storage::FileRepository;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub dsl: DslConfig,
    pub storage: StorageConfig,
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DslConfig {
    /// Token rotation period in seconds
    pub period_secs: u64,
    pub distribution_point: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub registry_file: String,
    pub publication_file: String,
    pub key_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub align_to_epoch: bool,
}

impl DslConfig {
    pub fn period(&self) -> Result<Period, ConfigError> {
        Period::from_secs(self.period_secs).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

impl StorageConfig {
    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join(&self.registry_file)
    }

    pub fn publication_path(&self) -> PathBuf {
        self.data_dir.join(&self.publication_file)
    }

    pub fn key_path(&self) -> PathBuf {
        self.data_dir.join(&self.key_file)
    }

    pub fn repository(&self) -> FileRepository {
        FileRepository::new(self.registry_path(), self.publication_path())
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    pub fn load_with_sources(
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default("dsl.period_secs", Period::DEFAULT_SECS)?
            .set_default("dsl.distribution_point", DEFAULT_DISTRIBUTION_POINT)?
            .set_default("storage.data_dir", ".")?
            .set_default("storage.registry_file", "dsl-map.json")?
            .set_default("storage.publication_file", "dsl.json")?
            .set_default("storage.key_file", "issuer_key.pem")?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.align_to_epoch", true)?
            .add_source(File::with_name("config/settings").required(false));

        // If env_vars is provided, we use it instead of system environment
        // This is to avoid systems variables pollution across tests
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // Should be in the format APP_DSL__PERIOD_SECS or APP_STORAGE__DATA_DIR
            builder = builder.add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.dsl.period()?;
        Ok(config)
    }

    /// Scheduler settings with the interval tied to the token period
    pub fn scheduler_config(&self) -> Result<SchedulerConfig, ConfigError> {
        Ok(SchedulerConfig {
            enabled: self.scheduler.enabled,
            interval: Duration::from_secs(self.dsl.period()?.as_secs()),
            align_to_epoch: self.scheduler.align_to_epoch,
        })
    }
}
