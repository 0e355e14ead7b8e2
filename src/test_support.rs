//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::core::lock;
use crate::core::persistence::{MemoryFragment, NavigationEvent, PersistError, PersistenceAdapter};
use crate::core::route::{Destination, by_key};
use crate::core::router::{Router, RouterOptions};
use crate::core::state::State;
use crate::core::view::{AnchorSlot, ViewError, ViewFactory};

/// Stand-in for a DOM node: a div containing the destination as text.
#[derive(Debug, PartialEq)]
pub struct TextView {
    pub text: String,
}

/// A factory that counts builds and can be told to fail or stall.
#[derive(Default)]
pub struct CountingFactory {
    calls: AtomicUsize,
    failing: Mutex<HashSet<Destination>>,
    delays: Mutex<HashMap<Destination, Duration>>,
}

impl CountingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_on(&self, destination: Destination) {
        lock(&self.failing).insert(destination);
    }

    pub fn delay(&self, destination: Destination, delay: Duration) {
        lock(&self.delays).insert(destination, delay);
    }
}

#[async_trait]
impl ViewFactory for CountingFactory {
    type View = TextView;

    async fn init_view(&self, destination: &Destination) -> Result<TextView, ViewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = lock(&self.delays).get(destination).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if lock(&self.failing).contains(destination) {
            return Err(ViewError::Invalid(format!("refusing to build {destination}")));
        }
        Ok(TextView {
            text: destination.to_string(),
        })
    }
}

/// A router over `{count: n}` states routed by `count`, with all collaborators exposed.
pub fn counter_router(
    default_state: State,
) -> (
    Arc<Router<TextView>>,
    Arc<AnchorSlot<TextView>>,
    Arc<MemoryFragment>,
    Arc<CountingFactory>,
) {
    let anchor = Arc::new(AnchorSlot::new());
    let store = Arc::new(MemoryFragment::new());
    let factory = Arc::new(CountingFactory::new());
    let router = Arc::new(Router::new(RouterOptions {
        anchor: anchor.clone(),
        default_state: Some(default_state),
        init_view: factory.clone(),
        route: by_key("count"),
        persistence: store.clone(),
    }));
    (router, anchor, store, factory)
}

/// An adapter with nothing persisted whose writes always fail.
pub struct FailingStore {
    events: broadcast::Sender<NavigationEvent>,
}

impl FailingStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(4);
        Self { events }
    }
}

impl PersistenceAdapter for FailingStore {
    fn read(&self) -> Option<State> {
        None
    }

    fn write(&self, _state: &State) -> Result<(), PersistError> {
        Err(PersistError::Io {
            path: PathBuf::from("fragment"),
            source: io::Error::other("disk full"),
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.events.subscribe()
    }
}
