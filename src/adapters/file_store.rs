//! JSON file store adapter.
//!
//! Implements [`LedgerStore`] and [`ConfigPort`] over three files in one
//! directory (`/spiffs` on the device, a temp dir in tests):
//!
//! | File               | Contents                                  |
//! |--------------------|-------------------------------------------|
//! | `dish_counts.json` | `{"Paul": 3, "Pranav": 1, ...}`           |
//! | `duty_order.json`  | `["Pranav", "Svanik", "Paul"]`            |
//! | `config.json`      | optional partial [`SystemConfig`] override |
//!
//! A missing file reads as "nothing stored". A file that is not valid
//! JSON of the right shape reads as [`StorageError::Corrupted`]. Entries
//! of the wrong type inside an otherwise valid file are skipped, so one
//! bad value does not discard the rest. Writes go to a `.tmp` sibling
//! first and are renamed into place.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_json::Value;

use crate::app::ports::{ConfigError, ConfigPort, LedgerStore, StorageError};
use crate::config::SystemConfig;

pub const COUNTS_FILE: &str = "dish_counts.json";
pub const ORDER_FILE: &str = "duty_order.json";
pub const CONFIG_FILE: &str = "config.json";

pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        info!("FileStore: using {}", base.display());
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn read(&self, file: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.base.join(file)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                warn!("FileStore: reading {} failed: {}", file, e);
                Err(StorageError::Io)
            }
        }
    }

    fn write(&self, file: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.base.join(file);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|e| {
                warn!("FileStore: writing {} failed: {}", file, e);
                StorageError::Io
            })
    }
}

impl LedgerStore for FileStore {
    fn load_counts(&self) -> Result<Option<BTreeMap<String, u32>>, StorageError> {
        let Some(bytes) = self.read(COUNTS_FILE)? else {
            return Ok(None);
        };
        let Value::Object(map) =
            serde_json::from_slice(&bytes).map_err(|_| StorageError::Corrupted)?
        else {
            return Err(StorageError::Corrupted);
        };
        let counts = map
            .into_iter()
            .filter_map(|(name, v)| {
                let n = v.as_u64().and_then(|n| u32::try_from(n).ok());
                if n.is_none() {
                    warn!("FileStore: skipping bad count for '{}': {}", name, v);
                }
                n.map(|n| (name, n))
            })
            .collect();
        Ok(Some(counts))
    }

    fn save_counts(&mut self, counts: &BTreeMap<String, u32>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(counts).map_err(|_| StorageError::Encode)?;
        self.write(COUNTS_FILE, &bytes)
    }

    fn load_rotation(&self) -> Result<Option<Vec<String>>, StorageError> {
        let Some(bytes) = self.read(ORDER_FILE)? else {
            return Ok(None);
        };
        let Value::Array(items) =
            serde_json::from_slice(&bytes).map_err(|_| StorageError::Corrupted)?
        else {
            return Err(StorageError::Corrupted);
        };
        Ok(Some(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ))
    }

    fn save_rotation(&mut self, rotation: &[String]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(rotation).map_err(|_| StorageError::Encode)?;
        self.write(ORDER_FILE, &bytes)
    }
}

impl ConfigPort for FileStore {
    /// Defaults overlaid with `config.json`, if present. Missing keys keep
    /// their defaults.
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let bytes = match self.read(CONFIG_FILE) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(SystemConfig::default()),
            Err(_) => return Err(ConfigError::IoError),
        };
        let config: SystemConfig =
            serde_json::from_slice(&bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }
}
