use metaforica_service::{
    DefaultAppState,
    config::ServiceConfig,
    db::establish_connection,
    medium::fetch::ReqwestFetcher,
    routes::create_router,
    shutdown::{DrainLayer, ShutdownState},
};
use std::sync::{Arc, Mutex};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("metaforica_service=debug".parse().unwrap()),
        )
        .init();

    let config = ServiceConfig::from_env().unwrap_or_else(|err| {
        error!(error = %err, "Invalid configuration");
        std::process::exit(1);
    });

    let connection = establish_connection(&config.database_url).unwrap_or_else(|err| {
        error!(database_url = %config.database_url, error = %err, "Failed to open database");
        std::process::exit(1);
    });

    info!(database_url = %config.database_url, "Connected to database");

    let fetcher = ReqwestFetcher::new(&config.fetch_settings()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to build HTTP client");
        std::process::exit(1);
    });

    let app_state = DefaultAppState::new(Arc::new(Mutex::new(connection)), Arc::new(fetcher));
    let shutdown_state = ShutdownState::new();

    let app = create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DrainLayer::new(shutdown_state.clone()))
                .layer(TimeoutLayer::new(config.request_timeout)),
        )
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .unwrap_or_else(|err| {
            error!(bind_address = %config.bind_address, error = %err, "Failed to bind to address");
            std::process::exit(1);
        });

    info!(bind_address = %config.bind_address, "Server running");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(shutdown_state));

    if let Err(err) = server.await {
        error!(error = %err, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal(shutdown_state: ShutdownState) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        in_flight = shutdown_state.in_flight_count(),
        "Shutdown signal received, draining requests"
    );
    shutdown_state.start_shutdown();
    shutdown_state.drained().await;
    info!("Graceful shutdown completed - all requests finished");
}
