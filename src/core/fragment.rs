//! # Fragment Wire Format
//!
//! State is persisted as `percent-encode(JSON(state))`, the same shape a
//! browser stores in `location.hash` via `encodeURIComponent`. Decoding
//! accepts an optional leading `#` so raw `location.hash` values work too.
//!
//! ```text
//! {"count":0}  ──encode──▶  %7B%22count%22%3A0%7D  ──decode──▶  {"count":0}
//! ```

use log::debug;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use thiserror::Error;

use crate::core::state::{State, is_restorable};

/// Everything `encodeURIComponent` escapes: all but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub const FRAGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Why a fragment could not be turned back into state.
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("fragment is empty")]
    Empty,
    #[error("malformed percent escape at byte {0}")]
    MalformedEscape(usize),
    #[error("fragment is not valid UTF-8 once decoded")]
    InvalidUtf8,
    #[error("fragment is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode state into its fragment form (no leading `#`).
pub fn encode(state: &State) -> String {
    encode_raw(&state.to_string())
}

/// Percent-encode arbitrary text with the fragment escape set.
///
/// Used by hosts that let users type JSON directly into an address bar.
pub fn encode_raw(text: &str) -> String {
    utf8_percent_encode(text, FRAGMENT_ENCODE_SET).to_string()
}

/// Decode a fragment back into state.
pub fn decode(fragment: &str) -> Result<State, FragmentError> {
    let body = fragment.strip_prefix('#').unwrap_or(fragment);
    if body.is_empty() {
        return Err(FragmentError::Empty);
    }
    check_escapes(body)?;
    let json = percent_decode_str(body)
        .decode_utf8()
        .map_err(|_| FragmentError::InvalidUtf8)?;
    Ok(serde_json::from_str(&json)?)
}

/// Decode a fragment, collapsing every failure into "nothing to restore".
pub fn read_state(fragment: &str) -> Option<State> {
    match decode(fragment) {
        Ok(state) if is_restorable(&state) => Some(state),
        Ok(state) => {
            debug!("Fragment decoded to non-restorable state {}", state);
            None
        }
        Err(e) => {
            debug!("Fragment not decodable: {}", e);
            None
        }
    }
}

/// `percent_decode_str` passes stray `%` through untouched; reject them instead.
fn check_escapes(body: &str) -> Result<(), FragmentError> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(FragmentError::MalformedEscape(i));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::deep_equals;
    use serde_json::json;

    #[test]
    fn test_encode_matches_encode_uri_component() {
        assert_eq!(encode(&json!({"count": 0})), "%7B%22count%22%3A0%7D");
        assert_eq!(encode_raw("a b/c?"), "a%20b%2Fc%3F");
        assert_eq!(encode_raw("-_.!~*'()"), "-_.!~*'()");
    }

    #[test]
    fn test_decode_accepts_leading_hash() {
        let state = decode("#%7B%22count%22%3A1%7D").unwrap();
        assert_eq!(state, json!({"count": 1}));
    }

    #[test]
    fn test_decode_accepts_unescaped_json() {
        // Browsers sometimes hand back the fragment already decoded.
        let state = decode(r#"#{"count":0}"#).unwrap();
        assert_eq!(state, json!({"count": 0}));
    }

    #[test]
    fn test_unicode_survives_encoding() {
        let state = json!({"title": "héllo wörld ✓", "tags": ["日本"]});
        let fragment = encode(&state);
        assert!(fragment.is_ascii());
        assert!(deep_equals(&decode(&fragment).unwrap(), &state));
    }

    #[test]
    fn test_decode_empty_fragment() {
        assert!(matches!(decode(""), Err(FragmentError::Empty)));
        assert!(matches!(decode("#"), Err(FragmentError::Empty)));
    }

    #[test]
    fn test_decode_malformed_escape() {
        assert!(matches!(decode("%7B%2"), Err(FragmentError::MalformedEscape(3))));
        assert!(matches!(decode("%zz"), Err(FragmentError::MalformedEscape(0))));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(matches!(decode("%FF%FE"), Err(FragmentError::InvalidUtf8)));
    }

    #[test]
    fn test_decode_malformed_json() {
        assert!(matches!(decode("not-json"), Err(FragmentError::Json(_))));
    }

    #[test]
    fn test_read_state_treats_failures_and_falsy_values_as_absent() {
        assert_eq!(read_state("garbage%"), None);
        assert_eq!(read_state("null"), None);
        assert_eq!(read_state("0"), None);
        assert_eq!(read_state(&encode(&json!({"page": "a"}))), Some(json!({"page": "a"})));
    }
}
