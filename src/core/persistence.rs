//! # Persistence Adapters
//!
//! The router never touches a global "location". It reads and writes its
//! fragment through a [`PersistenceAdapter`] and learns about externally
//! triggered navigation by subscribing to the adapter's event stream.
//!
//! Two adapters ship with the crate:
//!
//! - [`MemoryFragment`]: process-local, used by tests and embedders.
//! - [`FileFragment`]: one file holding the fragment, so state survives a
//!   restart. Writes use atomic rename (write `.tmp`, then `rename()`).
//!
//! Both keep a short back-stack of fragments so hosts can offer a "back"
//! action. Router writes never fire navigation events; only `navigate` and
//! `back` do.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::core::fragment;
use crate::core::lock;
use crate::core::state::State;

const EVENT_CAPACITY: usize = 16;
const MAX_HISTORY: usize = 64;

/// Failure writing the persisted representation.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("fragment I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What caused a navigation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationCause {
    /// The fragment was replaced from outside the router.
    External,
    /// The host stepped back to the previous fragment.
    Back,
}

/// Signal that the persisted fragment changed underneath the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationEvent {
    pub cause: NavigationCause,
}

/// Storage for the router's persisted state plus its navigation signal.
pub trait PersistenceAdapter: Send + Sync {
    /// Decode the current fragment. `None` means "nothing to restore".
    fn read(&self) -> Option<State>;

    /// Replace the fragment with the encoding of `state`.
    fn write(&self, state: &State) -> Result<(), PersistError>;

    /// Subscribe to navigation events.
    fn subscribe(&self) -> broadcast::Receiver<NavigationEvent>;
}

/// Back-stack of fragments. The last entry is the current fragment.
#[derive(Debug, Default)]
struct FragmentHistory {
    entries: Vec<String>,
}

impl FragmentHistory {
    fn seeded(fragment: Option<String>) -> Self {
        Self {
            entries: fragment.into_iter().collect(),
        }
    }

    fn current(&self) -> &str {
        self.entries.last().map(String::as_str).unwrap_or("")
    }

    fn push(&mut self, fragment: String) {
        if self.current() == fragment {
            return;
        }
        self.entries.push(fragment);
        if self.entries.len() > MAX_HISTORY {
            self.entries.remove(0);
        }
    }

    /// The entry before the current one, if any.
    fn previous(&self) -> Option<&str> {
        let idx = self.entries.len().checked_sub(2)?;
        Some(self.entries[idx].as_str())
    }

    /// Drop the current entry and return the one before it.
    fn back(&mut self) -> Option<String> {
        let previous = self.previous()?.to_string();
        self.entries.pop();
        Some(previous)
    }
}

fn notify(events: &broadcast::Sender<NavigationEvent>, cause: NavigationCause) {
    if events.send(NavigationEvent { cause }).is_err() {
        debug!("Navigation event ({:?}) dropped: no subscribers", cause);
    }
}

// ============================================================================
// In-memory adapter
// ============================================================================

/// A fragment held in memory.
pub struct MemoryFragment {
    history: Mutex<FragmentHistory>,
    events: broadcast::Sender<NavigationEvent>,
}

impl Default for MemoryFragment {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFragment {
    pub fn new() -> Self {
        Self::with_fragment("")
    }

    /// Start with a pre-existing fragment, as if the page loaded with one.
    pub fn with_fragment(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            history: Mutex::new(FragmentHistory::seeded((!raw.is_empty()).then_some(raw))),
            events,
        }
    }

    /// The raw fragment as currently stored.
    pub fn fragment(&self) -> String {
        lock(&self.history).current().to_string()
    }

    /// Replace the fragment from outside the router and fire a navigation event.
    pub fn navigate(&self, raw: impl Into<String>) {
        lock(&self.history).push(raw.into());
        notify(&self.events, NavigationCause::External);
    }

    /// Step back one fragment. Returns false when there is nowhere to go.
    pub fn back(&self) -> bool {
        let stepped = lock(&self.history).back().is_some();
        if stepped {
            notify(&self.events, NavigationCause::Back);
        }
        stepped
    }
}

impl PersistenceAdapter for MemoryFragment {
    fn read(&self) -> Option<State> {
        fragment::read_state(lock(&self.history).current())
    }

    fn write(&self, state: &State) -> Result<(), PersistError> {
        let encoded = fragment::encode(state);
        debug!("Persisting fragment #{}", encoded);
        lock(&self.history).push(encoded);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.events.subscribe()
    }
}

// ============================================================================
// File-backed adapter
// ============================================================================

/// A fragment stored in a single file.
pub struct FileFragment {
    path: PathBuf,
    history: Mutex<FragmentHistory>,
    events: broadcast::Sender<NavigationEvent>,
}

impl FileFragment {
    /// Open (without creating) the fragment file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let existing = read_fragment_file(&path);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            path,
            history: Mutex::new(FragmentHistory::seeded(existing.filter(|raw| !raw.is_empty()))),
            events,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw fragment as currently stored on disk (empty if missing).
    pub fn fragment(&self) -> String {
        read_fragment_file(&self.path).unwrap_or_default()
    }

    /// Replace the fragment from outside the router and fire a navigation event.
    pub fn navigate(&self, raw: impl Into<String>) -> Result<(), PersistError> {
        let raw = raw.into();
        atomic_write(&self.path, &raw)?;
        lock(&self.history).push(raw);
        notify(&self.events, NavigationCause::External);
        Ok(())
    }

    /// Step back one fragment. Returns `Ok(false)` when there is nowhere to go.
    ///
    /// The history only moves once the file holds the previous fragment, so a
    /// failed write leaves both where they were.
    pub fn back(&self) -> Result<bool, PersistError> {
        {
            let mut history = lock(&self.history);
            let Some(previous) = history.previous().map(str::to_string) else {
                return Ok(false);
            };
            atomic_write(&self.path, &previous)?;
            history.back();
        }
        notify(&self.events, NavigationCause::Back);
        Ok(true)
    }
}

impl PersistenceAdapter for FileFragment {
    fn read(&self) -> Option<State> {
        read_fragment_file(&self.path).and_then(|raw| fragment::read_state(&raw))
    }

    fn write(&self, state: &State) -> Result<(), PersistError> {
        let encoded = fragment::encode(state);
        atomic_write(&self.path, &encoded)?;
        debug!("Persisted fragment #{} to {}", encoded, self.path.display());
        lock(&self.history).push(encoded);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.events.subscribe()
    }
}

fn read_fragment_file(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(raw) => Some(raw.trim().to_string()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            debug!("Could not read fragment file {}: {}", path.display(), e);
            None
        }
    }
}

/// Atomically write `contents` to `path` (via `.tmp` + rename).
fn atomic_write(path: &Path, contents: &str) -> Result<(), PersistError> {
    let io_err = |source: io::Error| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents).map_err(io_err)?;
    fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_write_then_read() {
        let store = MemoryFragment::new();
        assert_eq!(store.read(), None);
        store.write(&json!({"count": 3})).unwrap();
        assert_eq!(store.fragment(), "%7B%22count%22%3A3%7D");
        assert_eq!(store.read(), Some(json!({"count": 3})));
    }

    #[test]
    fn test_memory_navigate_fires_event() {
        let store = MemoryFragment::new();
        let mut events = store.subscribe();
        store.navigate("garbage");
        assert_eq!(store.fragment(), "garbage");
        assert_eq!(store.read(), None);
        let event = events.try_recv().unwrap();
        assert_eq!(event.cause, NavigationCause::External);
    }

    #[test]
    fn test_memory_write_does_not_fire_event() {
        let store = MemoryFragment::new();
        let mut events = store.subscribe();
        store.write(&json!({"page": "a"})).unwrap();
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_memory_back_restores_previous_fragment() {
        let store = MemoryFragment::new();
        store.write(&json!({"page": "a"})).unwrap();
        store.write(&json!({"page": "b"})).unwrap();
        let mut events = store.subscribe();

        assert!(store.back());
        assert_eq!(store.read(), Some(json!({"page": "a"})));
        assert_eq!(events.try_recv().unwrap().cause, NavigationCause::Back);

        // Nothing before the first entry.
        assert!(!store.back());
    }

    #[test]
    fn test_history_skips_duplicate_writes() {
        let store = MemoryFragment::new();
        store.write(&json!({"page": "a"})).unwrap();
        store.write(&json!({"page": "a"})).unwrap();
        assert!(!store.back());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = FragmentHistory::default();
        for i in 0..(MAX_HISTORY + 10) {
            history.push(i.to_string());
        }
        assert_eq!(history.entries.len(), MAX_HISTORY);
        assert_eq!(history.current(), (MAX_HISTORY + 9).to_string());
    }

    #[test]
    fn test_file_fragment_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("fragment");

        let store = FileFragment::open(&path);
        assert_eq!(store.read(), None);
        store.write(&json!({"page": "about"})).unwrap();
        assert!(!path.with_extension("tmp").exists());

        let reopened = FileFragment::open(&path);
        assert_eq!(reopened.read(), Some(json!({"page": "about"})));
    }

    #[test]
    fn test_file_fragment_navigate_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFragment::open(dir.path().join("fragment"));
        store.write(&json!({"page": "index"})).unwrap();
        let mut events = store.subscribe();

        store.navigate("%7B%22page%22%3A%22b%22%7D").unwrap();
        assert_eq!(store.read(), Some(json!({"page": "b"})));
        assert_eq!(events.try_recv().unwrap().cause, NavigationCause::External);

        assert!(store.back().unwrap());
        assert_eq!(store.read(), Some(json!({"page": "index"})));
        assert!(!store.back().unwrap());
    }

    #[test]
    fn test_file_fragment_failed_back_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragment");
        let store = FileFragment::open(&path);
        for page in ["a", "b", "c"] {
            store.write(&json!({"page": page})).unwrap();
        }

        // A non-empty directory in the file's place makes the rename fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();
        assert!(matches!(store.back(), Err(PersistError::Io { .. })));

        fs::remove_dir_all(&path).unwrap();
        fs::write(&path, fragment::encode(&json!({"page": "c"}))).unwrap();

        assert!(store.back().unwrap());
        assert_eq!(store.read(), Some(json!({"page": "b"})));
        assert!(store.back().unwrap());
        assert_eq!(store.read(), Some(json!({"page": "a"})));
        assert!(!store.back().unwrap());
    }

    #[test]
    fn test_history_previous_does_not_move() {
        let mut history = FragmentHistory::default();
        assert_eq!(history.previous(), None);
        history.push("a".to_string());
        history.push("b".to_string());
        assert_eq!(history.previous(), Some("a"));
        assert_eq!(history.current(), "b");
        assert_eq!(history.back().as_deref(), Some("a"));
        assert_eq!(history.previous(), None);
    }

    #[test]
    fn test_file_fragment_unparsable_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragment");
        fs::write(&path, "%%not json").unwrap();
        let store = FileFragment::open(&path);
        assert_eq!(store.read(), None);
        assert_eq!(store.fragment(), "%%not json");
    }
}
