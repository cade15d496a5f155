//! Persistence settings
//!
//! Passed in by the host page as JSON (or built in code on native).
//! Unknown or missing fields fall back to defaults.

use std::path::PathBuf;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

#[cfg(not(target_arch = "wasm32"))]
use crate::platform::FileStore;
#[cfg(target_arch = "wasm32")]
use crate::platform::LocalStorageStore;

/// Bridge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The one LocalStorage key holding the save
    pub storage_key: String,
    /// Log level name ("off", "error", "warn", "info", "debug", "trace")
    pub log_level: String,
    /// Save file used by native builds
    pub save_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_key: Self::DEFAULT_STORAGE_KEY.to_string(),
            log_level: "info".to_string(),
            save_path: PathBuf::from("game_state.json"),
        }
    }
}

impl Settings {
    /// Key the page script has always used
    pub const DEFAULT_STORAGE_KEY: &'static str = "gameState";

    /// Parse settings JSON, falling back to defaults when it is unusable
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(mut settings) => {
                if settings.storage_key.trim().is_empty() {
                    log::warn!(
                        "Empty storage key, using {:?}",
                        Self::DEFAULT_STORAGE_KEY
                    );
                    settings.storage_key = Self::DEFAULT_STORAGE_KEY.to_string();
                }
                settings
            }
            Err(e) => {
                log::warn!("Invalid settings ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Parsed log level (unknown names mean `info`)
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// Storage slot for this platform (WASM: LocalStorage)
    #[cfg(target_arch = "wasm32")]
    pub fn store(&self) -> LocalStorageStore {
        LocalStorageStore::new(&self.storage_key)
    }

    /// Storage slot for this platform (native: save file)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn store(&self) -> FileStore {
        FileStore::new(&self.save_path)
    }
}
