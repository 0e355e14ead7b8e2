use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::TitleBar;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

/// Router facts the frame needs, read once per draw by the event loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct RouterSnapshot {
    pub cached: usize,
    pub out_of_sync: bool,
}

pub fn draw_ui(frame: &mut Frame, tui: &mut TuiState, snapshot: RouterSnapshot) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0), Length(3)]);
    let [title_area, page_area, address_area] = layout.areas(frame.area());

    let page_title = tui
        .page_view
        .page
        .as_ref()
        .map(|page| page.title.clone())
        .unwrap_or_default();
    TitleBar::new(
        page_title,
        snapshot.cached,
        tui.status_message.clone(),
        snapshot.out_of_sync,
    )
    .render(frame, title_area);

    tui.page_view.render(frame, page_area);
    tui.address_bar.render(frame, address_area);
}
