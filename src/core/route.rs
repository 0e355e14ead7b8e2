//! # Route Resolution
//!
//! A route is a pure function from [`State`] to a [`Destination`]. The
//! destination is only ever used as a view-cache key, so it has to be
//! hashable and primitive: it is never persisted.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::state::State;

/// A route resolver supplied by the owning application.
pub type RouteFn = Arc<dyn Fn(&State) -> Result<Destination, RouteError> + Send + Sync>;

/// Errors raised while computing a destination.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The resolver refused the state.
    #[error("route rejected state: {0}")]
    Rejected(String),
    /// The value picked as a destination was an array or object.
    #[error("destination must be a primitive value, got {0}")]
    NotPrimitive(Value),
}

/// Cache key identifying which view to show.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    Null,
    Bool(bool),
    Integer(i64),
    /// Non-integral number, stored by bit pattern.
    Float(u64),
    Text(String),
}

impl Destination {
    /// Convert a primitive JSON value into a destination.
    ///
    /// Integral numbers map to `Integer` whatever their JSON spelling, so
    /// `1` and `1.0` land on the same cache entry.
    pub fn from_value(value: &Value) -> Result<Self, RouteError> {
        match value {
            Value::Null => Ok(Destination::Null),
            Value::Bool(b) => Ok(Destination::Bool(*b)),
            Value::String(s) => Ok(Destination::Text(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Destination::Integer(i));
                }
                match n.as_f64() {
                    Some(f) => Ok(Destination::from(f)),
                    None => Err(RouteError::NotPrimitive(value.clone())),
                }
            }
            Value::Array(_) | Value::Object(_) => Err(RouteError::NotPrimitive(value.clone())),
        }
    }
}

impl From<f64> for Destination {
    fn from(f: f64) -> Self {
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            return Destination::Integer(f as i64);
        }
        Destination::Float(f.to_bits())
    }
}

impl From<i64> for Destination {
    fn from(i: i64) -> Self {
        Destination::Integer(i)
    }
}

impl From<&str> for Destination {
    fn from(s: &str) -> Self {
        Destination::Text(s.to_string())
    }
}

impl From<String> for Destination {
    fn from(s: String) -> Self {
        Destination::Text(s)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Null => write!(f, "null"),
            Destination::Bool(b) => write!(f, "{b}"),
            Destination::Integer(i) => write!(f, "{i}"),
            Destination::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Destination::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Wrap a closure as a [`RouteFn`].
pub fn route_fn<F>(f: F) -> RouteFn
where
    F: Fn(&State) -> Result<Destination, RouteError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Route on a single top-level field: `state => state[key]`.
///
/// A missing field (or a non-object state) resolves to `Destination::Null`.
pub fn by_key(key: impl Into<String>) -> RouteFn {
    let key = key.into();
    route_fn(move |state| match state.get(&key) {
        Some(value) => Destination::from_value(value),
        None => Ok(Destination::Null),
    })
}
