//! Versioned save envelope
//!
//! ```json
//! {"format":"game-save","version":1,"digest":"<blake3 hex>","state":{...}}
//! ```
//!
//! Anything well-formed that does not carry the `format` tag is a legacy
//! save: the whole document is the state, at [`LEGACY_VERSION`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

use super::migration::{LEGACY_VERSION, Migration, Migrations, adopt_legacy};
use super::validation;
use super::{DecodeError, EncodeError};

/// Tag identifying an enveloped save
pub const FORMAT_TAG: &str = "game-save";

/// Schema version written by [`SaveCodec::default`]
pub const DEFAULT_VERSION: u32 = 1;

/// Deepest state nesting `encode` accepts. Leaves room for the envelope
/// under serde_json's parse recursion limit of 128.
pub const MAX_STATE_DEPTH: usize = 100;

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    format: &'static str,
    version: u32,
    digest: String,
    state: &'a RawValue,
}

#[derive(Deserialize)]
struct EnvelopeIn<'a> {
    version: u32,
    digest: String,
    #[serde(borrow)]
    state: &'a RawValue,
}

/// A decoded save and the schema version it was written under
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<S> {
    pub state: S,
    pub version: u32,
}

/// Encoder/decoder for one state schema version plus its upgrade path
#[derive(Debug, Clone)]
pub struct SaveCodec {
    version: u32,
    migrations: Migrations,
}

impl Default for SaveCodec {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION).with_migration(LEGACY_VERSION, adopt_legacy)
    }
}

impl SaveCodec {
    /// Codec writing `version`, with no migrations registered
    pub fn new(version: u32) -> Self {
        Self {
            version,
            migrations: Migrations::new(),
        }
    }

    /// Register the step upgrading `from` to `from + 1`
    pub fn with_migration(mut self, from: u32, step: Migration) -> Self {
        self.migrations.register(from, step);
        self
    }

    /// Current schema version
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Serialize `state` into a full envelope
    pub fn encode<S: Serialize + ?Sized>(&self, state: &S) -> Result<String, EncodeError> {
        let payload = serde_json::value::to_raw_value(state)?;
        let depth = validation::nesting_depth(payload.get());
        if depth > MAX_STATE_DEPTH {
            return Err(EncodeError::TooDeep {
                depth,
                limit: MAX_STATE_DEPTH,
            });
        }
        let envelope = EnvelopeOut {
            format: FORMAT_TAG,
            version: self.version,
            digest: validation::digest(payload.get()),
            state: &*payload,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Parse text written by this or any older supported version
    pub fn decode<S: DeserializeOwned>(&self, text: &str) -> Result<Decoded<S>, DecodeError> {
        let document: Value =
            serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let (version, state) = if is_envelope(&document) {
            let envelope: EnvelopeIn<'_> = serde_json::from_str(text)
                .map_err(|e| DecodeError::mismatch(None, format!("bad envelope: {e}")))?;
            validation::verify(envelope.state.get(), &envelope.digest)?;
            if envelope.version == self.version {
                // Nothing to migrate: read the payload directly so numbers
                // beyond what `Value` holds survive
                let state = serde_json::from_str(envelope.state.get()).map_err(|e| {
                    DecodeError::mismatch(
                        Some(envelope.version),
                        format!("state does not fit schema: {e}"),
                    )
                })?;
                return Ok(Decoded {
                    state,
                    version: envelope.version,
                });
            }
            let state = serde_json::from_str(envelope.state.get())
                .map_err(|e| DecodeError::Malformed(e.to_string()))?;
            (envelope.version, state)
        } else {
            log::info!("Found legacy save without envelope");
            (LEGACY_VERSION, document)
        };

        let state = self.migrations.upgrade(version, self.version, state)?;
        let state = serde_json::from_value(state).map_err(|e| {
            DecodeError::mismatch(Some(version), format!("state does not fit schema: {e}"))
        })?;

        Ok(Decoded { state, version })
    }
}

fn is_envelope(document: &Value) -> bool {
    document.get("format").and_then(Value::as_str) == Some(FORMAT_TAG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Progress {
        level: u32,
        score: u64,
        name: String,
    }

    /// Hand-built envelope, as an older build would have written it
    fn envelope(version: u32, state: &str) -> String {
        format!(
            r#"{{"format":"{FORMAT_TAG}","version":{version},"digest":"{}","state":{state}}}"#,
            validation::digest(state)
        )
    }

    fn rename_points(mut state: Value) -> Result<Value, String> {
        let obj = state.as_object_mut().ok_or("state is not an object")?;
        let points = obj.remove("points").ok_or("missing points")?;
        obj.insert("score".to_string(), points);
        Ok(state)
    }

    #[test]
    fn test_encode_carries_version_and_digest() {
        let codec = SaveCodec::new(3);
        let text = codec.encode(&json!({"level": 2})).unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["format"], FORMAT_TAG);
        assert_eq!(doc["version"], 3);
        assert_eq!(doc["digest"], validation::digest(r#"{"level":2}"#));
        assert_eq!(doc["state"], json!({"level": 2}));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let codec = SaveCodec::default();
        let state = Progress {
            level: 4,
            score: 1200,
            name: "hatchet".to_string(),
        };
        assert_eq!(codec.encode(&state).unwrap(), codec.encode(&state).unwrap());
    }

    #[test]
    fn test_typed_round_trip() {
        let codec = SaveCodec::default();
        let state = Progress {
            level: 7,
            score: 99_000,
            name: "tree \"oak\"".to_string(),
        };
        let decoded: Decoded<Progress> = codec.decode(&codec.encode(&state).unwrap()).unwrap();
        assert_eq!(decoded.state, state);
        assert_eq!(decoded.version, DEFAULT_VERSION);
    }

    #[test]
    fn test_non_string_keys_fail_to_encode() {
        let mut state = BTreeMap::new();
        state.insert(vec![1u8, 2], 3u32);
        assert!(SaveCodec::default().encode(&state).is_err());
    }

    fn nested(depth: usize) -> Value {
        let mut state = json!(1);
        for _ in 0..depth {
            state = json!([state]);
        }
        state
    }

    #[test]
    fn test_deepest_allowed_state_round_trips() {
        let codec = SaveCodec::default();
        let state = nested(MAX_STATE_DEPTH);
        let decoded: Decoded<Value> = codec.decode(&codec.encode(&state).unwrap()).unwrap();
        assert_eq!(decoded.state, state);
    }

    #[test]
    fn test_too_deep_state_fails_to_encode() {
        let err = SaveCodec::default().encode(&nested(130)).unwrap_err();
        match err {
            EncodeError::TooDeep { depth, limit } => {
                assert_eq!(depth, 130);
                assert_eq!(limit, MAX_STATE_DEPTH);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_integer_beyond_u64_round_trips() {
        let codec = SaveCodec::default();
        let big = u128::from(u64::MAX) + 1;
        let decoded: Decoded<u128> = codec.decode(&codec.encode(&big).unwrap()).unwrap();
        assert_eq!(decoded.state, big);

        let scores = vec![big, 7, u128::MAX];
        let decoded: Decoded<Vec<u128>> = codec.decode(&codec.encode(&scores).unwrap()).unwrap();
        assert_eq!(decoded.state, scores);
    }

    #[test]
    fn test_malformed_text() {
        let codec = SaveCodec::default();
        for text in ["", "not json", "{\"level\":", "[1, 2"] {
            let err = codec.decode::<Value>(text).unwrap_err();
            assert!(matches!(err, DecodeError::Malformed(_)), "{text:?} gave {err:?}");
        }
    }

    #[test]
    fn test_legacy_save_is_adopted() {
        // What the page script stored before envelopes: JSON.stringify(gameState)
        let codec = SaveCodec::default();
        let decoded: Decoded<Progress> = codec
            .decode(r#"{"level":3,"score":40,"name":"old"}"#)
            .unwrap();
        assert_eq!(decoded.version, LEGACY_VERSION);
        assert_eq!(decoded.state.level, 3);
    }

    #[test]
    fn test_legacy_null_is_rejected() {
        let err = SaveCodec::default().decode::<Value>("null").unwrap_err();
        assert!(matches!(err, DecodeError::SchemaMismatch { version: Some(0), .. }));
    }

    #[test]
    fn test_legacy_without_migration_is_rejected() {
        let codec = SaveCodec::new(1);
        let err = codec.decode::<Value>(r#"{"level":3}"#).unwrap_err();
        assert!(matches!(err, DecodeError::SchemaMismatch { version: Some(0), .. }));
    }

    #[test]
    fn test_older_version_is_migrated() {
        let codec = SaveCodec::new(2).with_migration(1, rename_points);
        let text = envelope(1, r#"{"level":2,"points":150,"name":"a"}"#);
        let decoded: Decoded<Progress> = codec.decode(&text).unwrap();
        assert_eq!(decoded.version, 1);
        assert_eq!(
            decoded.state,
            Progress {
                level: 2,
                score: 150,
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn test_older_version_without_path_is_rejected() {
        let codec = SaveCodec::new(2);
        let text = envelope(1, r#"{"level":2,"points":150,"name":"a"}"#);
        let err = codec.decode::<Progress>(&text).unwrap_err();
        assert!(matches!(err, DecodeError::SchemaMismatch { version: Some(1), .. }));
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let codec = SaveCodec::default();
        let text = envelope(DEFAULT_VERSION + 1, r#"{"level":1}"#);
        let err = codec.decode::<Value>(&text).unwrap_err();
        assert!(matches!(err, DecodeError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_shape_mismatch_is_not_defaulted() {
        // Missing `name` must not be filled in silently
        let codec = SaveCodec::default();
        let text = envelope(DEFAULT_VERSION, r#"{"level":1,"score":2}"#);
        let err = codec.decode::<Progress>(&text).unwrap_err();
        assert!(matches!(err, DecodeError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_incomplete_envelope_is_rejected() {
        let codec = SaveCodec::default();
        let text = format!(r#"{{"format":"{FORMAT_TAG}","state":{{}}}}"#);
        let err = codec.decode::<Value>(&text).unwrap_err();
        assert!(matches!(err, DecodeError::SchemaMismatch { version: None, .. }));
    }

    #[test]
    fn test_tampered_state_is_corrupted() {
        let codec = SaveCodec::default();
        let text = codec.encode(&json!({"score": 10})).unwrap();
        let tampered = text.replace(r#""score":10"#, r#""score":9999"#);
        let err = codec.decode::<Value>(&tampered).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupted { .. }));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            any::<u64>().prop_map(Value::from),
            (-1.0e12f64..1.0e12).prop_map(Value::from),
            ".*".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
                prop::collection::btree_map(".*", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(state in arb_json()) {
            let codec = SaveCodec::default();
            let text = codec.encode(&state).unwrap();
            let decoded: Decoded<Value> = codec.decode(&text).unwrap();
            prop_assert_eq!(decoded.state, state);
            prop_assert_eq!(decoded.version, DEFAULT_VERSION);
        }
    }
}
