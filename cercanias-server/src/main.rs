use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cercanias_server::cache::ScheduleCache;
use cercanias_server::config::ServerConfig;
use cercanias_server::events::Notifier;
use cercanias_server::horarios::HorariosClient;
use cercanias_server::refresh::RefreshScheduler;
use cercanias_server::stations::StationDirectory;
use cercanias_server::web::{AppState, create_router};
use cercanias_server::widget::Widget;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().expect("Invalid configuration");

    // Open the cache and install the configured route if it changed
    let cache = Arc::new(ScheduleCache::open(&config.cache));
    if let Some(route) = config.initial_route.clone()
        && cache.current_route().await.as_ref() != Some(&route)
    {
        info!(%route, "installing configured route");
        cache
            .configure_route(route)
            .await
            .expect("Failed to save configured route");
    }
    if cache.current_route().await.is_none() {
        warn!("no route configured; set CERCANIAS_ORIGIN and CERCANIAS_DESTINATION");
    }

    let directory = StationDirectory::builtin();
    let client = HorariosClient::new(config.horarios.clone(), directory.clone())
        .expect("Failed to create horarios client");

    // Periodic refresh, first tick immediately
    let notifier = Notifier::new();
    let scheduler = RefreshScheduler::new(client, cache.clone(), notifier.clone(), config.refresh);
    let cancel = CancellationToken::new();
    let ticker = scheduler.spawn(cancel.clone());

    let widget = Widget::new(cache, Arc::new(scheduler), notifier);
    let app = create_router(AppState::new(widget, directory));

    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    info!(%addr, "Cercanías widget listening on http://{addr}");

    let shutdown = {
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            cancel.cancel();
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!(error = %e, "server error");
    }

    cancel.cancel();
    if let Err(e) = ticker.await {
        error!(error = %e, "refresh ticker failed");
    }
    info!("shut down");
}
