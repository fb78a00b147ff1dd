use std::net::SocketAddr;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulseboard_api::background::{metrics_broadcast, metrics_generator, session_sweep};
use pulseboard_api::config::ServerConfig;
use pulseboard_api::router::build_app_router;
use pulseboard_api::state::AppState;
use pulseboard_api::ws;

/// How long each background task gets to finish after cancellation.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pulseboard_api=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = pulseboard_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    pulseboard_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    pulseboard_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- App state ---
    let state = AppState::new(pool.clone(), config.clone());
    let hub = state.hub.clone();

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let mut tasks: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

    if config.generator.enabled {
        tasks.push((
            "metrics generator",
            tokio::spawn(metrics_generator::run(
                pool.clone(),
                config.generator.clone(),
                cancel.clone(),
            )),
        ));
    } else {
        tracing::info!("Metrics generator disabled");
    }
    tasks.push((
        "metrics broadcast",
        tokio::spawn(metrics_broadcast::run(
            pool.clone(),
            hub.clone(),
            config.broadcast.clone(),
            cancel.clone(),
        )),
    ));
    tasks.push((
        "session sweep",
        tokio::spawn(session_sweep::run(
            pool.clone(),
            Duration::from_secs(config.session_sweep_interval_secs),
            cancel.clone(),
        )),
    ));
    tasks.push((
        "heartbeat",
        tokio::spawn(ws::heartbeat::run(hub.clone(), cancel.clone())),
    ));

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    for (name, handle) in tasks {
        match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(())) => tracing::info!(task = name, "Background task stopped"),
            Ok(Err(e)) => tracing::error!(task = name, error = %e, "Background task panicked"),
            Err(_) => tracing::warn!(task = name, "Background task did not stop in time"),
        }
    }

    let ws_count = hub.connection_count().await;
    tracing::info!(ws_count, "Closing remaining real-time connections");
    hub.shutdown().await;

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
