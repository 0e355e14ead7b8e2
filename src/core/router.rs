//! # Router
//!
//! The state-transition and view-caching engine.
//!
//! ```text
//!  start() ─┐
//!  set_state(s) ─┼──▶ deep_equals(s, current)? ──yes──▶ Transition::Unchanged
//!  navigation ───┘              │ no
//!                               ▼
//!                     current = s (committed)
//!                               │
//!                     route(s) ──▶ Destination
//!                               │
//!                 cache hit? ───┴─── miss: init_view(d).await
//!                               │
//!                     cache[d] (first insert wins)
//!                               │
//!                     anchor.show(view)
//!                               │
//!                     persistence.write(current)
//! ```
//!
//! Overlapping transitions are not sequenced. Each one runs the pipeline to
//! completion, and whichever reaches `show` last is what stays on screen. The
//! persisted fragment always reflects the current state at the moment it is
//! written.
//!
//! A failing route or view build leaves the new state committed while the
//! previous view stays displayed. Callers that care can `set_state` back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::core::lock;
use crate::core::persistence::{PersistError, PersistenceAdapter};
use crate::core::route::{Destination, RouteError, RouteFn};
use crate::core::state::{State, deep_equals, empty_state};
use crate::core::view::{Anchor, ViewError, ViewFactory};

/// Errors a transition can fail with.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("failed to build view for {destination}: {source}")]
    ViewBuild {
        destination: Destination,
        #[source]
        source: ViewError,
    },
    #[error("failed to persist state: {0}")]
    Persist(#[from] PersistError),
}

/// Outcome of a successful `set_state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The candidate deep-equalled the current state; nothing ran.
    Unchanged,
    /// The pipeline ran: a view was shown and the state persisted.
    Rendered {
        destination: Destination,
        cache_hit: bool,
    },
}

/// Outcome of handling one navigation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The fragment held nothing restorable; nothing happened.
    Ignored,
    /// The decoded state was fed through `set_state`.
    Applied(Transition),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Unstarted,
    Started,
}

/// Everything a router needs, supplied by the owning application.
pub struct RouterOptions<V> {
    /// Display target for built views.
    pub anchor: Arc<dyn Anchor<V>>,
    /// State used when nothing is persisted. `None` means `{}`.
    pub default_state: Option<State>,
    /// Async view builder.
    pub init_view: Arc<dyn ViewFactory<View = V>>,
    /// Pure `State -> Destination` resolver.
    pub route: RouteFn,
    /// Where state is persisted and navigation events come from.
    pub persistence: Arc<dyn PersistenceAdapter>,
}

pub struct Router<V> {
    anchor: Arc<dyn Anchor<V>>,
    default_state: State,
    init_view: Arc<dyn ViewFactory<View = V>>,
    route: RouteFn,
    persistence: Arc<dyn PersistenceAdapter>,
    state: Mutex<Option<State>>,
    view_cache: Mutex<HashMap<Destination, Arc<V>>>,
    navigation_hook: Mutex<Option<JoinHandle<()>>>,
}

impl<V: Send + Sync + 'static> Router<V> {
    pub fn new(options: RouterOptions<V>) -> Self {
        Self {
            anchor: options.anchor,
            default_state: options.default_state.unwrap_or_else(empty_state),
            init_view: options.init_view,
            route: options.route,
            persistence: options.persistence,
            state: Mutex::new(None),
            view_cache: Mutex::new(HashMap::new()),
            navigation_hook: Mutex::new(None),
        }
    }

    /// Register the navigation hook and perform the initial transition.
    ///
    /// The initial state is whatever the adapter can restore, falling back
    /// to the default state. Calling `start` again replaces the hook.
    pub async fn start(self: &Arc<Self>) -> Result<Transition, RouterError> {
        self.register_navigation_hook();
        let initial = match self.persistence.read() {
            Some(state) => {
                info!("Restoring persisted state {}", state);
                state
            }
            None => {
                info!("No persisted state, starting from default {}", self.default_state);
                self.default_state.clone()
            }
        };
        self.set_state(initial).await
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if lock(&self.navigation_hook).is_some() {
            Lifecycle::Started
        } else {
            Lifecycle::Unstarted
        }
    }

    /// The current state, or `None` before the first transition.
    pub fn get_state(&self) -> Option<State> {
        lock(&self.state).clone()
    }

    /// Number of destinations with a cached view.
    pub fn cached_destinations(&self) -> usize {
        lock(&self.view_cache).len()
    }

    /// Where the current state routes, or `None` before the first transition.
    pub fn destination(&self) -> Result<Option<Destination>, RouteError> {
        self.get_state().map(|state| (self.route)(&state)).transpose()
    }

    /// Propose a new state.
    ///
    /// Resolves once the matching view is displayed and the state persisted,
    /// or immediately if `candidate` deep-equals the current state.
    pub async fn set_state(&self, candidate: State) -> Result<Transition, RouterError> {
        {
            let mut current = lock(&self.state);
            if current.as_ref().is_some_and(|s| deep_equals(s, &candidate)) {
                debug!("State unchanged, skipping render: {}", candidate);
                return Ok(Transition::Unchanged);
            }
            *current = Some(candidate.clone());
        }
        self.recompute(&candidate).await
    }

    /// Handle one navigation event: re-read the adapter and apply what it holds.
    pub async fn handle_navigation(&self) -> Result<Navigation, RouterError> {
        match self.persistence.read() {
            Some(state) => Ok(Navigation::Applied(self.set_state(state).await?)),
            None => {
                debug!("Navigation to undecodable fragment ignored");
                Ok(Navigation::Ignored)
            }
        }
    }

    async fn recompute(&self, state: &State) -> Result<Transition, RouterError> {
        let destination = (self.route)(state)?;

        let cached = lock(&self.view_cache).get(&destination).cloned();
        let cache_hit = cached.is_some();
        let built = match cached {
            Some(view) => {
                debug!("View cache hit for {}", destination);
                view
            }
            None => {
                debug!("View cache miss for {}, building", destination);
                let view = self
                    .init_view
                    .init_view(&destination)
                    .await
                    .map_err(|source| RouterError::ViewBuild {
                        destination: destination.clone(),
                        source,
                    })?;
                Arc::new(view)
            }
        };

        // A concurrent transition may have cached this destination while we
        // were building; its instance wins.
        let view = lock(&self.view_cache)
            .entry(destination.clone())
            .or_insert(built)
            .clone();

        self.anchor.show(view);

        let current = lock(&self.state).clone().unwrap_or_else(|| state.clone());
        self.persistence.write(&current)?;

        info!("Rendered {} (cache hit: {})", destination, cache_hit);
        Ok(Transition::Rendered {
            destination,
            cache_hit,
        })
    }

    fn register_navigation_hook(self: &Arc<Self>) {
        let events = self.persistence.subscribe();
        let handle = tokio::spawn(listen_for_navigation(Arc::downgrade(self), events));
        if let Some(previous) = lock(&self.navigation_hook).replace(handle) {
            debug!("Replacing previous navigation hook");
            previous.abort();
        }
    }
}

impl<V> Drop for Router<V> {
    fn drop(&mut self) {
        if let Some(hook) = lock(&self.navigation_hook).take() {
            hook.abort();
        }
    }
}

/// Forward each navigation event into its own transition.
///
/// Holds only a weak reference so the hook never keeps the router alive.
async fn listen_for_navigation<V: Send + Sync + 'static>(
    router: Weak<Router<V>>,
    mut events: tokio::sync::broadcast::Receiver<crate::core::persistence::NavigationEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let Some(router) = router.upgrade() else {
                    break;
                };
                debug!("Navigation event: {:?}", event.cause);
                tokio::spawn(async move {
                    if let Err(e) = router.handle_navigation().await {
                        warn!("Navigation transition failed: {}", e);
                    }
                });
            }
            Err(RecvError::Lagged(skipped)) => {
                // Events carry no payload; the next one re-reads the fragment anyway.
                debug!("Navigation listener lagged by {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
