//! # Router State
//!
//! The application's notion of "where it is". Waypoint treats state as an
//! opaque JSON value: it only ever compares it and serializes it.
//!
//! ```text
//! State (serde_json::Value)
//! ├── Null
//! ├── Bool
//! ├── Number        // compared by numeric value, so 1 == 1.0
//! ├── String
//! ├── Array         // ordered, compared element-wise
//! └── Object        // key order never matters
//! ```
//!
//! `Value` is a tree, so the recursion in `deep_equals` cannot cycle.

use serde_json::Value;

/// The application state a router tracks. Any JSON-representable value.
pub type State = Value;

/// Structural equality over two states.
///
/// Objects are equal when they carry the same set of keys and every value
/// under those keys is itself deep-equal. Arrays compare pairwise. Numbers
/// compare by value, so `{"n": 1}` and `{"n": 1.0}` are the same state.
/// Values of different kinds are never equal.
pub fn deep_equals(a: &State, b: &State) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equals(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| deep_equals(x, y)))
        }
        _ => false,
    }
}

fn numbers_equal(x: &serde_json::Number, y: &serde_json::Number) -> bool {
    // Exact integer paths first: large i64/u64 values lose precision as f64.
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Whether a decoded state is worth restoring.
///
/// JSON-falsy values (`null`, `false`, `0`, `""`) count as "nothing
/// persisted", both at startup and on navigation.
pub fn is_restorable(state: &State) -> bool {
    match state {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The state used when nothing is persisted and no default was configured.
pub fn empty_state() -> State {
    Value::Object(serde_json::Map::new())
}
