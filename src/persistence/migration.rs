//! Per-version upgrade of saved state
//!
//! Each step rewrites the untyped JSON state from version `n` to `n + 1`.
//! Steps run in order until the codec's current version is reached; a
//! missing step means there is no path and the save is rejected.

use std::collections::BTreeMap;

use serde_json::Value;

use super::DecodeError;

/// Version assigned to saves written before the envelope existed
/// (plain `JSON.stringify(gameState)` text).
pub const LEGACY_VERSION: u32 = 0;

/// One upgrade step: state at version `n` in, state at `n + 1` out.
/// An `Err` carries the reason the step cannot account for its input.
pub type Migration = fn(Value) -> Result<Value, String>;

/// Registered upgrade steps, keyed by source version
#[derive(Debug, Clone, Default)]
pub struct Migrations {
    steps: BTreeMap<u32, Migration>,
}

impl Migrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the step upgrading `from` to `from + 1` (replaces any previous one)
    pub fn register(&mut self, from: u32, step: Migration) {
        if self.steps.insert(from, step).is_some() {
            log::debug!("Replaced migration step from version {}", from);
        }
    }

    /// Bring `state` from version `from` up to version `to`
    pub fn upgrade(&self, from: u32, to: u32, mut state: Value) -> Result<Value, DecodeError> {
        if from > to {
            return Err(DecodeError::mismatch(
                Some(from),
                format!("saved by a newer schema (current is {to})"),
            ));
        }

        for version in from..to {
            let step = self.steps.get(&version).ok_or_else(|| {
                DecodeError::mismatch(
                    Some(from),
                    format!("no migration from version {version} to {}", version + 1),
                )
            })?;
            state = step(state).map_err(|reason| {
                DecodeError::mismatch(
                    Some(from),
                    format!("migration {version} -> {} failed: {reason}", version + 1),
                )
            })?;
            log::info!("Migrated saved state {} -> {}", version, version + 1);
        }

        Ok(state)
    }
}

/// Legacy saves already hold the bare state document; adopt it as-is.
/// `null` means the page once stored nothing and is not a state.
pub fn adopt_legacy(state: Value) -> Result<Value, String> {
    if state.is_null() {
        return Err("legacy save holds null".to_string());
    }
    Ok(state)
}
