//! Mirror configuration
//!
//! Settings for the periodic driver, loadable from TOML, JSON or YAML via
//! [`mirror_fs::ConfigStore`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use mirror_fs::ConfigStore;
use serde::Deserialize;

use crate::engine::MirrorOptions;
use crate::{Error, Result};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MirrorConfig {
    pub source: PathBuf,
    pub replica: PathBuf,
    /// Seconds to wait between the end of one run and the start of the next
    pub interval_secs: u64,
    /// Where the action log is appended; console only when absent
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_true")]
    pub size_prefilter: bool,
}

impl MirrorConfig {
    pub fn new(
        source: impl Into<PathBuf>,
        replica: impl Into<PathBuf>,
        interval_secs: u64,
    ) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
            interval_secs,
            log_file: None,
            dry_run: false,
            size_prefilter: true,
        }
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = ConfigStore::new().load(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(Error::InvalidConfig {
                message: "interval_secs must be greater than zero".into(),
            });
        }
        if self.source.as_os_str().is_empty() || self.replica.as_os_str().is_empty() {
            return Err(Error::InvalidConfig {
                message: "source and replica must both be set".into(),
            });
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn options(&self) -> MirrorOptions {
        MirrorOptions {
            dry_run: self.dry_run,
            size_prefilter: self.size_prefilter,
            ..MirrorOptions::default()
        }
    }
}
