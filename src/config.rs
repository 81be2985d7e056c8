//! Configuration management for the range analyser.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AnalyserError;
use crate::fs_abstraction::{real_fs, FileSystem};
use crate::validation::{validate_mask_range, validate_threshold};

/// Default minimum occupancy for a network to be called dense
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Default broadest prefix length scanned
pub const DEFAULT_MIN_MASK: u8 = 18;

/// Default most specific prefix length scanned
pub const DEFAULT_MAX_MASK: u8 = 30;

/// Default number of labels kept in each statistics ranking
pub const DEFAULT_TOP: usize = 20;

/// Parameters of a single aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    /// Minimum occupancy ratio, in (0, 1]
    pub threshold: f64,

    /// Broadest prefix length considered (network too broad below this)
    pub min_mask: u8,

    /// Most specific prefix length considered (network too narrow above this)
    pub max_mask: u8,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_mask: DEFAULT_MIN_MASK,
            max_mask: DEFAULT_MAX_MASK,
        }
    }
}

impl AnalyserConfig {
    /// Validate threshold and mask range.
    pub fn validate(&self) -> Result<(), AnalyserError> {
        validate_threshold(self.threshold)?;
        validate_mask_range(self.min_mask, self.max_mask)?;
        Ok(())
    }
}

/// Statistics report settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Compute and print statistics after the analysis
    pub enabled: bool,

    /// Number of entries in each top-N ranking
    pub top: usize,

    /// Geolocation table (YAML) used to label addresses
    pub geo_db: Option<PathBuf>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            top: DEFAULT_TOP,
            geo_db: None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Aggregation parameters
    pub analysis: AnalyserConfig,

    /// Statistics report
    pub stats: StatsConfig,
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_fs(path, real_fs())
    }

    /// Load configuration through the given filesystem
    pub fn load_with_fs<P, F>(path: P, fs: &F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: FileSystem + ?Sized,
    {
        let path = path.as_ref();
        let content = fs
            .read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_or_default_with_fs(path, real_fs())
    }

    /// Like [`Config::load_or_default`], through the given filesystem
    pub fn load_or_default_with_fs<P, F>(path: P, fs: &F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: FileSystem + ?Sized,
    {
        if fs.exists(path.as_ref()) {
            Self::load_with_fs(path, fs)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;

        if self.stats.top == 0 {
            anyhow::bail!("Invalid stats.top 0. Must be at least 1");
        }

        Ok(())
    }
}
