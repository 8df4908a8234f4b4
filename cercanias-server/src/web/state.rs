//! Application state for the web layer.

use std::sync::Arc;

use crate::stations::StationDirectory;
use crate::widget::Widget;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Display-facing facade
    pub widget: Widget,

    /// Stations routes may use
    pub directory: Arc<StationDirectory>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(widget: Widget, directory: StationDirectory) -> Self {
        Self {
            widget,
            directory: Arc::new(directory),
        }
    }
}
