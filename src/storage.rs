//! Persistence adapter: string-keyed JSON values on disk, one file per key.
//! Mirrors the web client's local storage layout, keys included.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::error::Result;

/// Entry collection.
pub const KEY_ENTRIES: &str = "cinelaunch_movies";
/// Flat genre list written by the legacy variant; read-only migration input.
pub const KEY_LEGACY_CATEGORIES: &str = "cinelaunch_categories";
/// Remote sync endpoint URL.
pub const KEY_SYNC_URL: &str = "cinelaunch_sync_url";
/// Admin flag.
pub const KEY_IS_ADMIN: &str = "cinelaunch_is_admin";

pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: PathBuf) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Storage { dir })
    }

    /// Platform data directory for the app, `./cinelaunch_data` as a last resort.
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("cinelaunch"))
            .unwrap_or_else(|| PathBuf::from("./cinelaunch_data"))
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Absent key reads as `None`. A value that cannot be read or parsed also
    /// reads as `None`; the corrupt file is left in place, not cleared.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(key, error = %e, "failed to read stored value");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "stored value is malformed, using defaults");
                None
            }
        }
    }

    /// Whole-value replace under the key. Callers treat failure as non-fatal:
    /// the in-memory state stays authoritative for the session.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(self.path_for(key), content)?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
