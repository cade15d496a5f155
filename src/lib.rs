//! Game Persist - save/restore bridge for a single-page browser game
//!
//! Core modules:
//! - `bridge`: Startup rehydration and write-on-change orchestration
//! - `persistence`: Versioned save envelope with integrity verification
//! - `platform`: Browser/native storage slot and logging
//! - `port`: Outbound save channel from the game runtime
//! - `settings`: Storage key and log level configuration
//! - `web`: wasm-bindgen facade for a JS-hosted runtime (WASM only)

pub mod bridge;
pub mod persistence;
pub mod platform;
pub mod port;
pub mod settings;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use bridge::{
    InitInput, Launched, PersistError, PersistenceBridge, Runtime, SaveWriter, StartupOutcome,
    StatsHandle, WriteStats,
};
pub use persistence::{DecodeError, EncodeError, SaveCodec};
pub use platform::{MemoryStore, StateStore, StoreError};
pub use port::{PortError, SavePort};
pub use settings::Settings;
