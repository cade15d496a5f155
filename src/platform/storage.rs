//! Single-slot durable storage
//!
//! Every backend owns exactly one key. Writes replace the whole value or
//! leave it untouched; there is no partial or merge write.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend refused the operation (quota, permissions, disabled storage)
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// One persistent text slot
pub trait StateStore {
    /// Current text, or `None` if never written or storage is unavailable
    fn read(&self) -> Option<String>;

    /// Replace the slot with `text` in full
    fn write(&mut self, text: &str) -> Result<(), StoreError>;

    /// Remove the slot (a missing slot is not an error)
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// A read the backend could not complete counts as absence, with a warning
fn slot_or_warn(read: Result<Option<String>, StoreError>) -> Option<String> {
    match read {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Cannot read saved state: {}", e);
            None
        }
    }
}

#[derive(Debug, Default)]
struct MemorySlot {
    value: Option<String>,
    unavailable: bool,
    quota: Option<usize>,
    writes: usize,
}

/// In-memory slot
///
/// Clones share the same slot, like two handles on one browser origin.
/// Availability and a byte quota can be toggled to emulate storage refusal.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<MemorySlot>>,
}

impl MemoryStore {
    /// Empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with `text` (e.g. a previous session's save)
    pub fn with_value(text: impl Into<String>) -> Self {
        let store = Self::new();
        store.slot.borrow_mut().value = Some(text.into());
        store
    }

    /// Disabled storage: reads see nothing, writes fail
    pub fn set_available(&self, available: bool) {
        self.slot.borrow_mut().unavailable = !available;
    }

    /// Reject writes longer than `bytes`
    pub fn set_quota(&self, bytes: Option<usize>) {
        self.slot.borrow_mut().quota = bytes;
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.slot.borrow().writes
    }
}

impl StateStore for MemoryStore {
    fn read(&self) -> Option<String> {
        let slot = self.slot.borrow();
        if slot.unavailable {
            return None;
        }
        slot.value.clone()
    }

    fn write(&mut self, text: &str) -> Result<(), StoreError> {
        let mut slot = self.slot.borrow_mut();
        if slot.unavailable {
            return Err(StoreError::Unavailable("storage disabled".to_string()));
        }
        if let Some(quota) = slot.quota {
            if text.len() > quota {
                return Err(StoreError::Unavailable(format!(
                    "quota exceeded ({} > {} bytes)",
                    text.len(),
                    quota
                )));
            }
        }
        slot.value = Some(text.to_string());
        slot.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let mut slot = self.slot.borrow_mut();
        if slot.unavailable {
            return Err(StoreError::Unavailable("storage disabled".to_string()));
        }
        slot.value = None;
        Ok(())
    }
}

/// `window.localStorage` slot (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Re-acquired per call: access can be revoked while the page runs
    fn storage() -> Result<web_sys::Storage, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::Unavailable("no window".to_string()))?;
        window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
fn js_error(err: wasm_bindgen::JsValue) -> StoreError {
    StoreError::Unavailable(format!("{:?}", err))
}

#[cfg(target_arch = "wasm32")]
impl StateStore for LocalStorageStore {
    fn read(&self) -> Option<String> {
        slot_or_warn(
            Self::storage().and_then(|storage| storage.get_item(&self.key).map_err(js_error)),
        )
    }

    fn write(&mut self, text: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(&self.key, text)
            .map_err(js_error)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        Self::storage()?.remove_item(&self.key).map_err(js_error)
    }
}

/// Single-file slot (native only)
///
/// Writes land in `<path>.tmp` and are renamed over the slot, so a failed
/// write never leaves partial text behind.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStore {
    path: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn tmp_path(&self) -> std::path::PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        tmp.into()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl StateStore for FileStore {
    fn read(&self) -> Option<String> {
        slot_or_warn(match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Unavailable(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        })
    }

    fn write(&mut self, text: &str) -> Result<(), StoreError> {
        let tmp = self.tmp_path();
        let result = std::fs::write(&tmp, text).and_then(|()| std::fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            let _ = std::fs::remove_file(&tmp);
            return Err(StoreError::Unavailable(format!(
                "{}: {}",
                self.path.display(),
                e
            )));
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Unavailable(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
