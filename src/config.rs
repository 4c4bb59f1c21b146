//! Config module.
//! Reads flowboard_config.json (data dir, storage key, export dir, log filter).
//! Every field is optional; missing ones fall back to the defaults.

use crate::error::Result;
use crate::storage::{FileStorage, STORAGE_KEY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "flowboard_config.json";
const LOG_FILE: &str = "flowboard.log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the board slot and the log file live
    pub data_dir: PathBuf,
    pub storage_key: String,
    /// Where exports are written
    pub export_dir: PathBuf,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("flowboard"),
            storage_key: STORAGE_KEY.to_string(),
            export_dir: PathBuf::from("."),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads `path`, or the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Writes a default config to `path`. Returns `false` if one was already there.
    pub fn init(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&Self::default())?)?;
        Ok(true)
    }

    pub fn storage(&self) -> FileStorage {
        FileStorage::new(&self.data_dir, &self.storage_key)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }
}
