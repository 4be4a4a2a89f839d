use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docextract::config::{Config, LogFormat};
use docextract::handlers::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // tracing must be up before configuration loading starts logging
    init_tracing(LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref()));

    let config = Config::from_env()?;

    tracing::info!("Starting docextract service");
    tracing::info!("Max file size: {} bytes", config.max_file_size_bytes);
    tracing::info!("Max concurrent requests: {}", config.max_concurrent_requests);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let app = create_router(AppState::new(config));

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "docextract=debug,tower_http=debug,axum::rejection=trace".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
