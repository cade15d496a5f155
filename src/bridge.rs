//! Persistence bridge between the game runtime and its storage slot
//!
//! Two phases:
//! - Startup (once): read the slot, decode, hand the result to the runtime
//! - Steady state: encode and write every state the runtime emits
//!
//! Nothing here is fatal. A save that cannot be decoded starts the game
//! fresh; a write that fails is dropped and superseded by the next one.

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::persistence::{DecodeError, EncodeError, SaveCodec};
use crate::platform::{StateStore, StoreError};
use crate::port::SavePort;

/// Value handed to the runtime at construction: a restored state, or `None`
/// to start fresh
pub type InitInput<S> = Option<S>;

/// What startup found in the slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupOutcome {
    /// Slot never written (or storage unavailable)
    Empty,
    /// Saved state decoded; `version` is the schema it was written under
    Restored { version: u32 },
    /// Saved text could not be used and the game starts fresh.
    /// The text stays in the slot until the first new save replaces it.
    Discarded(DecodeError),
}

impl StartupOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, StartupOutcome::Restored { .. })
    }
}

/// Why a single save did not reach storage
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Running tally of steady-state saves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Saves that reached storage
    pub written: u64,
    /// Saves refused by storage
    pub failed: u64,
    /// Saves that could not be encoded (never sent to storage)
    pub skipped: u64,
}

/// Shared view of a writer's [`WriteStats`], still readable after the
/// writer has moved into the runtime's save port
#[derive(Debug, Clone, Default)]
pub struct StatsHandle(Rc<Cell<WriteStats>>);

impl StatsHandle {
    pub fn get(&self) -> WriteStats {
        self.0.get()
    }

    fn update(&self, apply: impl FnOnce(&mut WriteStats)) {
        let mut stats = self.0.get();
        apply(&mut stats);
        self.0.set(stats);
    }
}

/// A game runtime that takes its initial state once and then emits saves
pub trait Runtime: Sized {
    type State: Serialize + DeserializeOwned + 'static;

    /// Build the runtime, resuming from `input` when present
    fn init(input: InitInput<Self::State>) -> Self;

    /// Outbound port the bridge subscribes to
    fn save_port(&mut self) -> &mut SavePort<Self::State>;
}

/// Bridge awaiting its startup read
#[derive(Debug)]
pub struct PersistenceBridge<St> {
    store: St,
    codec: SaveCodec,
}

/// Result of [`PersistenceBridge::launch`]
#[derive(Debug)]
pub struct Launched<R> {
    pub runtime: R,
    pub outcome: StartupOutcome,
    pub stats: StatsHandle,
}

/// Result of the startup phase
#[derive(Debug)]
pub struct Startup<S, St> {
    pub init: InitInput<S>,
    pub outcome: StartupOutcome,
    pub writer: SaveWriter<St>,
}

impl<St: StateStore> PersistenceBridge<St> {
    pub fn new(store: St, codec: SaveCodec) -> Self {
        Self { store, codec }
    }

    /// Read and decode the slot. Consumes the bridge so this runs at most once.
    pub fn start<S: DeserializeOwned>(self) -> Startup<S, St> {
        let (init, outcome) = match self.store.read() {
            None => {
                log::info!("No saved state, starting fresh");
                (None, StartupOutcome::Empty)
            }
            Some(text) => match self.codec.decode::<S>(&text) {
                Ok(decoded) => {
                    log::info!(
                        "Restored saved state (schema v{}, {} bytes)",
                        decoded.version,
                        text.len()
                    );
                    let outcome = StartupOutcome::Restored {
                        version: decoded.version,
                    };
                    (Some(decoded.state), outcome)
                }
                Err(e) => {
                    log::warn!("Discarding saved state, starting fresh: {}", e);
                    (None, StartupOutcome::Discarded(e))
                }
            },
        };

        Startup {
            init,
            outcome,
            writer: SaveWriter {
                store: self.store,
                codec: self.codec,
                stats: StatsHandle::default(),
            },
        }
    }

    /// Full startup: build `R` from the slot and subscribe to its saves
    pub fn launch<R>(self) -> Launched<R>
    where
        R: Runtime,
        St: 'static,
    {
        let Startup {
            init,
            outcome,
            mut writer,
        } = self.start::<R::State>();

        let mut runtime = R::init(init);
        let stats = writer.stats_handle();
        let subscribed = runtime.save_port().subscribe(move |state: &R::State| {
            // Failures are counted and logged by the writer
            let _ = writer.persist(state);
        });
        if let Err(e) = subscribed {
            log::error!("Saves will not be persisted: {}", e);
        }

        Launched {
            runtime,
            outcome,
            stats,
        }
    }
}

/// Steady-state half of the bridge
#[derive(Debug)]
pub struct SaveWriter<St> {
    store: St,
    codec: SaveCodec,
    stats: StatsHandle,
}

impl<St: StateStore> SaveWriter<St> {
    /// Encode `state` and replace the slot with it. On any failure the slot
    /// keeps its previous value.
    pub fn persist<S: Serialize + ?Sized>(&mut self, state: &S) -> Result<(), PersistError> {
        let text = match self.codec.encode(state) {
            Ok(text) => text,
            Err(e) => {
                self.stats.update(|s| s.skipped += 1);
                log::warn!("Save skipped: {}", e);
                return Err(e.into());
            }
        };

        match self.store.write(&text) {
            Ok(()) => {
                self.stats.update(|s| s.written += 1);
                log::debug!("Saved state ({} bytes)", text.len());
                Ok(())
            }
            Err(e) => {
                self.stats.update(|s| s.failed += 1);
                log::warn!("Save failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Drop the saved state (new game)
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.clear()?;
        log::info!("Saved state cleared");
        Ok(())
    }

    pub fn stats(&self) -> WriteStats {
        self.stats.get()
    }

    /// Handle that keeps reporting after the writer is moved
    pub fn stats_handle(&self) -> StatsHandle {
        self.stats.clone()
    }

    pub fn store(&self) -> &St {
        &self.store
    }
}
