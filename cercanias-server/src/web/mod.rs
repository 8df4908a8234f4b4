//! HTTP display surface for the widget.
//!
//! Serves the widget as an HTML page, its contents as JSON, the swap and
//! refresh actions, and a server-sent event stream of display events.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
