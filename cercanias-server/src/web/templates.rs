//! Askama templates for the widget page.

use askama::Template;

use crate::projector::DisplayCell;
use crate::refresh::RefreshState;
use crate::widget::WidgetFrame;

/// The widget page.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub route_label: String,
    pub has_route: bool,
    pub cells: Vec<CellView>,
    pub last_fetched: Option<String>,
    pub refreshing: bool,
}

impl IndexTemplate {
    /// Build the page from a widget frame.
    pub fn from_frame(frame: &WidgetFrame) -> Self {
        Self {
            route_label: frame.route_label.clone(),
            has_route: frame.route.is_some(),
            cells: frame.view.cells().iter().map(CellView::from_cell).collect(),
            last_fetched: frame
                .last_fetched_at
                .map(|at| at.format("%H:%M").to_string()),
            refreshing: frame.refresh_state != RefreshState::Idle,
        }
    }
}

/// One grid cell, flattened for the template.
#[derive(Debug, Clone, Default)]
pub struct CellView {
    pub departure: String,
    pub arrival: String,
    pub train_code: String,
    pub is_empty: bool,
}

impl CellView {
    pub fn from_cell(cell: &DisplayCell) -> Self {
        match cell {
            DisplayCell::Departure(entry) => Self {
                departure: entry.departure_time.to_string(),
                arrival: entry.arrival_time.to_string(),
                train_code: entry.train_code.clone(),
                is_empty: false,
            },
            DisplayCell::Empty => Self {
                is_empty: true,
                ..Self::default()
            },
        }
    }
}
