//! # TUI Components
//!
//! UI components for the terminal page browser.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! - `TitleBar`: Top status line (page title, cache size, status, sync warning)
//!
//! ### Stateful Components (Event-Driven)
//!
//! - `PageView`: The anchor. Shows the current page and owns its scroll offset
//! - `AddressBar`: Location bar showing the fragment; editing it navigates
//!
//! ### Props-Based Data Flow
//!
//! Components receive external data as props (public fields set by the event
//! loop before each draw), never by reaching into the router. The router is
//! only ever touched from `tui::run`.
//!
//! ```rust,ignore
//! // Good: the loop copies what the component needs
//! tui.page_view.page = anchor.current();
//!
//! // Bad: hidden dependency on the router
//! page_view.render(frame, area); // reads router.get_state()
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs          (this file)
//! ├── title_bar.rs    (Top status line)
//! ├── page_view.rs    (Scrollable page area)
//! └── address_bar.rs  (Editable location bar)
//! ```

pub mod address_bar;
pub mod page_view;
mod title_bar;

pub use address_bar::{AddressBar, AddressEvent};
pub use page_view::PageView;
pub use title_bar::TitleBar;
