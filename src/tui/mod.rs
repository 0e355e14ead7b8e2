//! # TUI Host
//!
//! A terminal page browser built on the router. Pages are markdown files;
//! the state's route key names the page; the fragment file plays the part
//! of the browser's location bar.
//!
//! This is the only module that knows about ratatui and crossterm. The
//! router runs on tokio tasks and reports back through a channel, so the
//! draw loop never awaits.
//!
//! ## Keys
//!
//! - **Browsing**: Tab / Shift+Tab cycle pages, Alt+← goes back, `e` or Enter
//!   edits the address, ↑ ↓ PgUp PgDn scroll, `q` or Esc quits.
//! - **Editing**: Enter navigates to the typed state, Esc cancels.
//! - Ctrl+C quits from anywhere.
//!
//! ## Redraw Strategy
//!
//! Nothing animates, so the loop sleeps up to 250ms between polls and only
//! redraws on input, resize, or a message from a router task.

mod anchor;
mod component;
mod components;
mod event;
pub mod markdown;
pub mod page;
mod ui;

use log::{debug, info, warn};
use percent_encoding::percent_decode_str;
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::cursor::SetCursorStyle;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::config::ResolvedConfig;
use crate::core::fragment;
use crate::core::persistence::FileFragment;
use crate::core::route::{Destination, by_key};
use crate::core::router::{Router, RouterOptions, Transition};
use crate::core::state::{State, empty_state};
use crate::tui::anchor::TerminalAnchor;
use crate::tui::component::EventHandler;
use crate::tui::components::{AddressBar, AddressEvent, PageView};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::tui::page::{Page, PageFactory, cycle, list_pages};
use crate::tui::ui::RouterSnapshot;

const IDLE_POLL: Duration = Duration::from_millis(250);

/// Messages from router tasks to the draw loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UiMessage {
    /// The anchor now shows the page for this destination.
    Shown(Destination),
    /// A transition started from the keyboard finished.
    Settled(Result<Transition, String>),
}

/// TUI-specific presentation state (not part of the router)
pub struct TuiState {
    pub page_view: PageView,
    pub address_bar: AddressBar,
    pub status_message: String,
    /// Page names for Tab cycling, sorted.
    pub pages: Vec<String>,
}

impl TuiState {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            page_view: PageView::new(),
            address_bar: AddressBar::new(),
            status_message: "Loading…".to_string(),
            pages,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste
        );
    }
}

/// Wire the router to the terminal: file fragment, markdown pages, and an
/// anchor that wakes the draw loop.
fn build_router(
    config: &ResolvedConfig,
    tx: mpsc::Sender<UiMessage>,
) -> (Arc<Router<Page>>, Arc<TerminalAnchor>, Arc<FileFragment>) {
    let fragment = Arc::new(FileFragment::open(&config.fragment_file));
    let anchor = Arc::new(TerminalAnchor::new(tx));
    let router = Arc::new(Router::new(RouterOptions {
        anchor: anchor.clone(),
        default_state: Some(config.default_state.clone()),
        init_view: Arc::new(PageFactory::new(&config.pages_dir)),
        route: by_key(config.route_key.clone()),
        persistence: fragment.clone(),
    }));
    (router, anchor, fragment)
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let (tx, rx) = mpsc::channel();
    let (router, anchor, fragment) = build_router(&config, tx.clone());

    let pages = list_pages(&config.pages_dir);
    if pages.is_empty() {
        warn!("No pages found in {}", config.pages_dir.display());
    }
    info!(
        "Browsing {} pages from {}, fragment at {}",
        pages.len(),
        config.pages_dir.display(),
        fragment.path().display()
    );
    let mut tui = TuiState::new(pages);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    {
        let router = router.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = router.start().await.map_err(|e| e.to_string());
            if tx.send(UiMessage::Settled(outcome)).is_err() {
                warn!("Router started after the event loop exited");
            }
        });
    }

    let mut needs_redraw = true;
    loop {
        if needs_redraw {
            tui.address_bar.location = display_location(&fragment.fragment());
            let snapshot = snapshot(&router, &anchor);
            terminal.draw(|f| ui::draw_ui(f, &mut tui, snapshot))?;
            needs_redraw = false;
        }

        let first_event = poll_event_timeout(IDLE_POLL);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if matches!(event, TuiEvent::Resize) {
                continue;
            }
            if matches!(event, TuiEvent::ForceQuit) {
                should_quit = true;
                break;
            }

            // Editing: every key goes to the address bar
            if tui.address_bar.editing {
                match tui.address_bar.handle_event(&event) {
                    Some(AddressEvent::Submit(text)) => {
                        tui.status_message = submit_location(&fragment, &text);
                    }
                    Some(AddressEvent::Cancel) => {
                        tui.status_message.clear();
                    }
                    Some(AddressEvent::Changed) | None => {}
                }
                continue;
            }

            // Browsing
            match event {
                TuiEvent::ScrollUp
                | TuiEvent::ScrollDown
                | TuiEvent::ScrollPageUp
                | TuiEvent::ScrollPageDown => {
                    tui.page_view.handle_event(&event);
                }
                TuiEvent::InputChar('q') | TuiEvent::Escape => {
                    should_quit = true;
                    break;
                }
                TuiEvent::InputChar('e') | TuiEvent::Submit => {
                    tui.address_bar.begin_edit();
                }
                TuiEvent::InputChar('r') => {
                    tui.pages = list_pages(&config.pages_dir);
                    tui.status_message = format!("{} pages", tui.pages.len());
                }
                TuiEvent::NextPage | TuiEvent::PrevPage => {
                    let step = if event == TuiEvent::NextPage { 1 } else { -1 };
                    let current = anchor.shown_destination().map(|d| page_name(&d));
                    match cycle(&tui.pages, current.as_deref(), step) {
                        Some(next) => {
                            tui.status_message = format!("Loading {next}…");
                            let state = with_page(router.get_state(), &config.route_key, next);
                            spawn_transition(&router, state, tx.clone());
                        }
                        None => tui.status_message = "No pages to cycle through".to_string(),
                    }
                }
                TuiEvent::Back => match fragment.back() {
                    Ok(true) => tui.status_message = "Back".to_string(),
                    Ok(false) => tui.status_message = "No earlier location".to_string(),
                    Err(e) => {
                        warn!("Back navigation failed: {}", e);
                        tui.status_message = format!("Error: {e}");
                    }
                },
                _ => {}
            }
        }

        if should_quit {
            break;
        }

        // Messages from router tasks
        while let Ok(message) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", message);
            match message {
                UiMessage::Shown(destination) => {
                    tui.page_view.page = anchor.current();
                    tui.page_view.reset_scroll();
                    tui.status_message = format!("Showing {destination}");
                }
                UiMessage::Settled(outcome) => {
                    if let Some(status) = describe(&outcome) {
                        tui.status_message = status;
                    }
                }
            }
        }
    }

    info!("Waypoint shutting down at #{}", fragment.fragment());
    ratatui::restore();
    Ok(())
}

fn spawn_transition(router: &Arc<Router<Page>>, state: State, tx: mpsc::Sender<UiMessage>) {
    debug!("Spawning transition to {}", state);
    let router = router.clone();
    tokio::spawn(async move {
        let outcome = router.set_state(state).await.map_err(|e| e.to_string());
        if tx.send(UiMessage::Settled(outcome)).is_err() {
            warn!("Transition settled after the event loop exited");
        }
    });
}

fn snapshot(router: &Router<Page>, anchor: &TerminalAnchor) -> RouterSnapshot {
    let shown = anchor.shown_destination();
    let out_of_sync = match (router.destination(), shown) {
        (Ok(Some(wanted)), Some(shown)) => wanted != shown,
        (Err(_), Some(_)) => true,
        _ => false,
    };
    RouterSnapshot {
        cached: router.cached_destinations(),
        out_of_sync,
    }
}

/// Write the typed text as the new fragment and report what will happen.
///
/// The router reacts to the navigation event on its own; this only predicts
/// whether it will ignore the fragment.
fn submit_location(fragment: &FileFragment, text: &str) -> String {
    let text = text.strip_prefix('#').unwrap_or(text);
    let raw = fragment::encode_raw(text);
    let status = match fragment::read_state(&raw) {
        Some(_) => format!("Navigating to #{text}"),
        None => "Not a restorable state; view unchanged".to_string(),
    };
    match fragment.navigate(raw) {
        Ok(()) => status,
        Err(e) => {
            warn!("Navigation failed: {}", e);
            format!("Error: {e}")
        }
    }
}

/// The fragment as a person would read it.
fn display_location(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// The page name a destination refers to.
fn page_name(destination: &Destination) -> String {
    match destination {
        Destination::Text(name) => name.clone(),
        other => other.to_string(),
    }
}

/// `current` with its route key pointed at `page`. Non-object states are
/// replaced.
fn with_page(current: Option<State>, route_key: &str, page: &str) -> State {
    let mut state = match current {
        Some(state @ State::Object(_)) => state,
        _ => empty_state(),
    };
    if let Some(map) = state.as_object_mut() {
        map.insert(route_key.to_string(), State::from(page));
    }
    state
}

fn describe(outcome: &Result<Transition, String>) -> Option<String> {
    match outcome {
        Ok(Transition::Unchanged) => Some("Already here".to_string()),
        Ok(Transition::Rendered {
            destination,
            cache_hit: true,
        }) => Some(format!("Showing {destination} (cached)")),
        // The Shown message already said so.
        Ok(Transition::Rendered { .. }) => None,
        Err(e) => Some(format!("Error: {e}")),
    }
}
