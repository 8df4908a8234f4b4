//! HTTP route handlers.

use std::convert::Infallible;

use askama::Template;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{
        Html, IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::controller::SwapError;

use super::dto::*;
use super::state::AppState;
use super::templates::IndexTemplate;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/api/view", get(view))
        .route("/api/swap", post(swap))
        .route("/api/refresh", post(refresh))
        .route("/api/events", get(events))
        .route("/api/stations", get(stations))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The widget as an HTML page.
async fn index_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let frame = state.widget.frame().await;
    let html = IndexTemplate::from_frame(&frame)
        .render()
        .map_err(|e| AppError::Internal {
            message: format!("Template error: {}", e),
        })?;
    Ok(Html(html))
}

/// The widget contents as JSON.
async fn view(State(state): State<AppState>) -> Json<ViewResponse> {
    Json(ViewResponse::from(state.widget.frame().await))
}

/// Reverse the active route.
async fn swap(State(state): State<AppState>) -> Result<Json<RouteResponse>, AppError> {
    let route = state.widget.request_swap().await?;
    Ok(Json(RouteResponse::from(&route)))
}

/// Ask for a refresh now.
async fn refresh(State(state): State<AppState>) -> (StatusCode, Json<RefreshResponse>) {
    let outcome = state.widget.request_manual_refresh();
    (StatusCode::ACCEPTED, Json(RefreshResponse::from(outcome)))
}

/// List known stations.
async fn stations(State(state): State<AppState>) -> Json<StationsResponse> {
    Json(StationsResponse {
        stations: state.directory.stations().to_vec(),
    })
}

/// Stream display events as server-sent events named after the event type.
async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.widget.subscribe();
    info!("display subscribed to events");

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        let sse = Event::default().event(event.name()).data(json);
                        return Some((Ok(sse), rx));
                    }
                    Err(e) => error!(error = %e, "failed to encode display event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "display event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    Conflict { message: String },
    Internal { message: String },
}

impl From<SwapError> for AppError {
    fn from(e: SwapError) -> Self {
        match e {
            SwapError::NoRoute => AppError::Conflict {
                message: e.to_string(),
            },
            SwapError::Cache(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
