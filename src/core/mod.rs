//! # Core Routing Logic
//!
//! Waypoint's state router. It knows nothing about terminals, browsers or
//! files beyond the traits it is handed.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (JSON value)   │
//!                    │  • Route (State → key)  │
//!                    │  • Router (cache, show, │
//!                    │    persist)             │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │ ViewFactory│      │   Anchor   │      │ Persistence│
//!     │ (pages,    │      │ (terminal, │      │ (memory,   │
//!     │  tests)    │      │  slot)     │      │  file)     │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: the `State` type and structural equality
//! - [`fragment`]: the percent-encoded JSON wire format
//! - [`persistence`]: where the fragment lives, plus navigation events
//! - [`route`]: destinations and route resolvers
//! - [`view`]: view factories and anchors
//! - [`router`]: the transition engine tying it together
//! - [`config`]: the binary's settings

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod config;
pub mod fragment;
pub mod persistence;
pub mod route;
pub mod router;
pub mod state;
pub mod view;

pub use persistence::{FileFragment, MemoryFragment, PersistenceAdapter};
pub use route::{Destination, RouteFn, by_key, route_fn};
pub use router::{Lifecycle, Navigation, Router, RouterError, RouterOptions, Transition};
pub use state::{State, deep_equals};
pub use view::{Anchor, AnchorSlot, ViewError, ViewFactory, view_fn};

/// Lock a mutex, recovering the data if a panicking holder poisoned it.
///
/// Critical sections in this crate never span an `.await`.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
