//! Browser entry point for a JS-hosted game runtime
//!
//! The page builds a `WebBridge`, passes `initInput()` to the runtime as its
//! startup flags, and forwards every outbound save to `save()`.

use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::Settings;
use crate::bridge::{PersistenceBridge, SaveWriter, StartupOutcome};
use crate::persistence::SaveCodec;
use crate::platform::{LocalStorageStore, logging};

#[wasm_bindgen]
pub struct WebBridge {
    init: Option<Value>,
    outcome: StartupOutcome,
    writer: SaveWriter<LocalStorageStore>,
}

#[wasm_bindgen]
impl WebBridge {
    /// `settings` is optional settings JSON (see `Settings`)
    #[wasm_bindgen(constructor)]
    pub fn new(settings: Option<String>) -> WebBridge {
        let settings = settings
            .map(|json| Settings::from_json(&json))
            .unwrap_or_default();
        logging::init(settings.level_filter());

        let startup = PersistenceBridge::new(settings.store(), SaveCodec::default())
            .start::<Value>();
        log::info!(
            "Persistence ready on key {:?} ({:?})",
            startup.writer.store().key(),
            startup.outcome
        );

        Self {
            init: startup.init,
            outcome: startup.outcome,
            writer: startup.writer,
        }
    }

    /// Saved state as a JS value, or `null`. Only the first call returns it.
    #[wasm_bindgen(js_name = initInput)]
    pub fn init_input(&mut self) -> JsValue {
        let Some(state) = self.init.take() else {
            return JsValue::NULL;
        };
        let parsed = serde_json::to_string(&state)
            .map_err(|e| e.to_string())
            .and_then(|text| js_sys::JSON::parse(&text).map_err(|e| format!("{:?}", e)));
        match parsed {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Restored state could not be handed to the page: {}", e);
                JsValue::NULL
            }
        }
    }

    /// True when a previous save existed but could not be used
    #[wasm_bindgen(getter)]
    pub fn discarded(&self) -> bool {
        matches!(self.outcome, StartupOutcome::Discarded(_))
    }

    /// Persist one outbound state (serialized with `JSON.stringify`)
    pub fn save(&mut self, state: JsValue) {
        let text = js_sys::JSON::stringify(&state)
            .ok()
            .and_then(|s| s.as_string());
        let Some(text) = text else {
            log::warn!("Save ignored: state is not JSON-representable");
            return;
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => {
                // Failures are counted and logged by the writer
                let _ = self.writer.persist(&value);
            }
            Err(e) => log::warn!("Save ignored: {}", e),
        }
    }

    /// Remove the save (new game)
    pub fn clear(&mut self) {
        if let Err(e) = self.writer.clear() {
            log::warn!("Could not clear save: {}", e);
        }
    }

    /// Number of saves that reached storage
    #[wasm_bindgen(getter, js_name = savedCount)]
    pub fn saved_count(&self) -> f64 {
        self.writer.stats().written as f64
    }

    /// Number of saves that were dropped (storage refused or not encodable)
    #[wasm_bindgen(getter, js_name = droppedCount)]
    pub fn dropped_count(&self) -> f64 {
        let stats = self.writer.stats();
        (stats.failed + stats.skipped) as f64
    }
}
