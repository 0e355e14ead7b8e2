//! # Views and the Anchor
//!
//! Views are opaque to the router. An application supplies a
//! [`ViewFactory`] that builds a view for a destination, and an [`Anchor`]
//! that puts a built view on screen. The router only caches and hands
//! around `Arc<V>` references.
//!
//! [`AnchorSlot`] is the default anchor: a single slot holding at most one
//! view. Hosts that want transition effects implement [`Anchor`] themselves,
//! usually by wrapping an `AnchorSlot`.

use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;

use crate::core::lock;
use crate::core::route::Destination;

/// Errors a view factory can report.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Nothing exists to build for this destination.
    #[error("no view for destination {0}")]
    NotFound(Destination),
    /// Loading the view's source failed.
    #[error("view I/O error: {0}")]
    Io(#[from] io::Error),
    /// The source loaded but could not be turned into a view.
    #[error("invalid view: {0}")]
    Invalid(String),
}

/// Builds the view for a destination. Called at most once per destination
/// unless transitions overlap; the first finished build is the one cached.
#[async_trait]
pub trait ViewFactory: Send + Sync {
    type View: Send + Sync + 'static;

    async fn init_view(&self, destination: &Destination) -> Result<Self::View, ViewError>;
}

/// Display sink for built views.
pub trait Anchor<V>: Send + Sync {
    /// Replace whatever is displayed with `view`.
    fn show(&self, view: Arc<V>);
}

/// The default anchor: one slot, at most one child.
pub struct AnchorSlot<V> {
    child: Mutex<Option<Arc<V>>>,
}

impl<V> Default for AnchorSlot<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> AnchorSlot<V> {
    pub fn new() -> Self {
        Self {
            child: Mutex::new(None),
        }
    }

    /// The view currently displayed, if any.
    pub fn current(&self) -> Option<Arc<V>> {
        lock(&self.child).clone()
    }

    /// Whether `view` is the exact instance being displayed.
    pub fn is_showing(&self, view: &Arc<V>) -> bool {
        lock(&self.child)
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, view))
    }
}

impl<V: Send + Sync> Anchor<V> for AnchorSlot<V> {
    fn show(&self, view: Arc<V>) {
        // Dropping the previous child removes it; the new one becomes the sole child.
        *lock(&self.child) = Some(view);
    }
}

/// A view factory backed by an async closure.
pub struct FnViewFactory<V> {
    build: Box<dyn Fn(Destination) -> BoxFuture<'static, Result<V, ViewError>> + Send + Sync>,
}

/// Wrap an async closure `Destination -> Result<V, ViewError>` as a factory.
pub fn view_fn<V, F, Fut>(f: F) -> FnViewFactory<V>
where
    F: Fn(Destination) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, ViewError>> + Send + 'static,
{
    FnViewFactory {
        build: Box::new(move |destination| Box::pin(f(destination))),
    }
}

#[async_trait]
impl<V: Send + Sync + 'static> ViewFactory for FnViewFactory<V> {
    type View = V;

    async fn init_view(&self, destination: &Destination) -> Result<V, ViewError> {
        (self.build)(destination.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_starts_empty() {
        let slot: AnchorSlot<String> = AnchorSlot::new();
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_show_replaces_the_single_child() {
        let slot = AnchorSlot::new();
        let first = Arc::new("first".to_string());
        let second = Arc::new("second".to_string());

        slot.show(first.clone());
        assert!(slot.is_showing(&first));

        slot.show(second.clone());
        assert!(slot.is_showing(&second));
        assert!(!slot.is_showing(&first));
        // The slot no longer holds the first view.
        assert_eq!(Arc::strong_count(&first), 1);
    }

    #[tokio::test]
    async fn test_view_fn_builds_from_destination() {
        let factory = view_fn(|d: Destination| async move { Ok(format!("<div>{d}</div>")) });
        let view = factory.init_view(&Destination::Integer(4)).await.unwrap();
        assert_eq!(view, "<div>4</div>");
    }

    #[tokio::test]
    async fn test_view_fn_propagates_errors() {
        let factory = view_fn(|d: Destination| async move {
            Err::<String, _>(ViewError::NotFound(d))
        });
        let err = factory.init_view(&Destination::from("missing")).await.unwrap_err();
        assert!(matches!(err, ViewError::NotFound(Destination::Text(ref s)) if s == "missing"));
    }
}
