//! Configuration loading via Figment.
//!
//! Configuration comes from three layers, later ones winning: built-in
//! defaults, an optional `seismolog.toml`, and `SEISMOLOG_*` environment
//! variables (section and key separated by a double underscore, e.g.
//! `SEISMOLOG_STORAGE__ROOT_DIR=/data`).

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::calibration::DEFAULT_CALIBRATION_READINGS;
use crate::error::{Result, SeismoError};
use crate::filter::DEFAULT_DECIMATION_FACTOR;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "seismolog.toml";

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "SEISMOLOG_";

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application-level settings.
    pub application: ApplicationConfig,
    /// Storage layout and flush cadence.
    pub storage: StorageConfig,
    /// Sampling pipeline settings.
    pub acquisition: AcquisitionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            storage: StorageConfig::default(),
            acquisition: AcquisitionConfig::default(),
        }
    }
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Logging level (trace, debug, info, warn, error) or a full
    /// `tracing` filter directive.
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root under which the `seismometer/readings` tree is created.
    pub root_dir: PathBuf,
    /// Day file extension, without the leading dot.
    pub extension: String,
    /// Seconds between writer flush cycles.
    pub flush_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("/home/pi"),
            extension: "ibsd".to_string(),
            flush_interval_secs: 5,
        }
    }
}

/// Sampling pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Raw samples summed into one reading.
    pub decimation_factor: u32,
    /// Readings averaged into the calibration offsets.
    pub calibration_readings: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            decimation_factor: DEFAULT_DECIMATION_FACTOR,
            calibration_readings: DEFAULT_CALIBRATION_READINGS,
        }
    }
}

impl Config {
    /// Load from `seismolog.toml` (if present) and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load from a specific TOML file (if present) and the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic validation beyond what parsing enforces.
    pub fn validate(&self) -> Result<()> {
        if self.acquisition.decimation_factor == 0 {
            return Err(SeismoError::Configuration(
                "acquisition.decimation_factor must be at least 1".into(),
            ));
        }
        if self.acquisition.calibration_readings == 0 {
            return Err(SeismoError::Configuration(
                "acquisition.calibration_readings must be at least 1".into(),
            ));
        }
        if self.storage.flush_interval_secs == 0 {
            return Err(SeismoError::Configuration(
                "storage.flush_interval_secs must be at least 1".into(),
            ));
        }
        if self.storage.extension.is_empty() {
            return Err(SeismoError::Configuration(
                "storage.extension must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Directory that receives day files:
    /// `<root_dir>/seismometer/readings`.
    pub fn data_dir(&self) -> PathBuf {
        self.storage.root_dir.join("seismometer").join("readings")
    }
}
