//! Configuration for Kolibri Store
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KolibriError, Result};

/// Main configuration for a Kolibri Store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── catalog.bin      (users, quotas and file records)
    ///     └── blobs/           (`<uuid>.kolibri` envelopes)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Codec Configuration
    // -------------------------------------------------------------------------
    /// Deflate level for the generic stage (1 = fastest, 9 = smallest)
    pub compression_level: u32,

    /// Version string written into every envelope
    pub codec_version: String,

    /// What to do when a downloaded object disagrees with its record
    pub integrity_mode: IntegrityMode,

    // -------------------------------------------------------------------------
    // Quota Configuration
    // -------------------------------------------------------------------------
    /// Storage limit given to newly registered users (in bytes)
    pub default_quota_limit: u64,

    /// Largest original payload accepted by `upload` (in bytes)
    pub max_upload_size: u64,
}

/// Download verification policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrityMode {
    /// Size or digest mismatch fails the download (fail closed)
    #[default]
    Strict,

    /// Mismatches are logged and the decoded bytes are returned anyway
    Permissive,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./kolibri_data"),
            compression_level: 9,
            codec_version: "1.0.0".to_string(),
            integrity_mode: IntegrityMode::Strict,
            default_quota_limit: 10 * 1024 * 1024 * 1024, // 10 GB
            max_upload_size: 100 * 1024 * 1024,           // 100 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings no store can run with
    pub fn validate(&self) -> Result<()> {
        if !(1..=9).contains(&self.compression_level) {
            return Err(KolibriError::Config(format!(
                "compression_level must be within 1..=9, got {}",
                self.compression_level
            )));
        }
        if self.codec_version.is_empty() {
            return Err(KolibriError::Config("codec_version must not be empty".to_string()));
        }
        if self.max_upload_size == 0 {
            return Err(KolibriError::Config("max_upload_size must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the deflate level (1..=9; checked by `Config::validate`)
    pub fn compression_level(mut self, level: u32) -> Self {
        self.config.compression_level = level;
        self
    }

    /// Set the version string recorded in envelopes
    pub fn codec_version(mut self, version: impl Into<String>) -> Self {
        self.config.codec_version = version.into();
        self
    }

    /// Set the download verification policy
    pub fn integrity_mode(mut self, mode: IntegrityMode) -> Self {
        self.config.integrity_mode = mode;
        self
    }

    /// Set the quota limit for newly registered users (in bytes)
    pub fn default_quota_limit(mut self, bytes: u64) -> Self {
        self.config.default_quota_limit = bytes;
        self
    }

    /// Set the maximum accepted upload size (in bytes)
    pub fn max_upload_size(mut self, bytes: u64) -> Self {
        self.config.max_upload_size = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
