//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging sink (console on web, env_logger on native)
//! - Storage (LocalStorage on web, a single file on native)

pub mod logging;
pub mod storage;

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorageStore;
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
pub use storage::{MemoryStore, StateStore, StoreError};
