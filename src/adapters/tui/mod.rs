//! Terminal Dashboard
//!
//! ratatui front end: token table, wallet panel, wallet menu and alerts.

pub mod app;
pub mod menu;
pub mod ui;
pub mod events;

pub use app::{App, AppEvent, MenuItem};
pub use ui::render_ui;
pub use events::{run, TuiError};
