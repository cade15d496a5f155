//! BLAKE3 integrity digest over the exact state payload text

use super::DecodeError;

/// Hex digest of `payload`
pub fn digest(payload: &str) -> String {
    blake3::hash(payload.as_bytes()).to_hex().to_string()
}

/// Check `payload` against a stored hex digest
pub fn verify(payload: &str, expected: &str) -> Result<(), DecodeError> {
    let computed = blake3::hash(payload.as_bytes());
    // Hash equality is constant-time; a non-hex digest can never match
    match blake3::Hash::from_hex(expected) {
        Ok(stored) if stored == computed => Ok(()),
        _ => Err(DecodeError::Corrupted {
            expected: expected.to_string(),
            computed: computed.to_hex().to_string(),
        }),
    }
}

/// Deepest array/object nesting in well-formed JSON text
pub fn nesting_depth(json: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in json.bytes() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    deepest
}
