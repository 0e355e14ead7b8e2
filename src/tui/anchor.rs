//! The terminal's anchor: an `AnchorSlot` that also wakes the event loop.

use std::sync::Arc;
use std::sync::mpsc::Sender;

use log::warn;

use crate::core::route::Destination;
use crate::core::view::{Anchor, AnchorSlot};
use crate::tui::UiMessage;
use crate::tui::page::Page;

pub struct TerminalAnchor {
    slot: AnchorSlot<Page>,
    notify: Sender<UiMessage>,
}

impl TerminalAnchor {
    pub fn new(notify: Sender<UiMessage>) -> Self {
        Self {
            slot: AnchorSlot::new(),
            notify,
        }
    }

    /// The page on screen, if any.
    pub fn current(&self) -> Option<Arc<Page>> {
        self.slot.current()
    }

    /// Destination of the page on screen, if any.
    pub fn shown_destination(&self) -> Option<Destination> {
        self.current().map(|page| page.destination.clone())
    }
}

impl Anchor<Page> for TerminalAnchor {
    fn show(&self, view: Arc<Page>) {
        let destination = view.destination.clone();
        self.slot.show(view);
        // Swapping pages resets the scroll position; the loop handles that.
        if self.notify.send(UiMessage::Shown(destination)).is_err() {
            warn!("Page shown after the event loop exited");
        }
    }
}
