use std::env;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use unified_extract::{
    config::LogFormat,
    handlers::{create_router, mark_started},
    AppState, Config, Dispatcher,
};

const DEFAULT_LOG_FILTER: &str = "unified_extract=debug,tower_http=debug,axum::rejection=trace";

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_target(false))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(false))
                .init();
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());
    mark_started();

    let config = Config::from_env()?;

    tracing::info!("Starting unified file extraction service");
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);
    tracing::info!("Request timeout: {}s", config.request_timeout_seconds);

    let dispatcher = Dispatcher::from_config(&config).await;

    // PORT takes precedence for platform deployments.
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server_port);
    let addr = format!("{}:{}", config.server_host, port);

    let app = create_router(AppState::new(config, dispatcher));

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
