// ABOUTME: Server bootstrap for Metatag: tracing, database pool, router and listener
// ABOUTME: Shared by the serve and migrate subcommands of the metatag binary

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::Router;
use metatag_api::{create_router, AppState};
use metatag_config::Settings;
use metatag_storage::db::connect;
use metatag_storage::{init, run_migrations, DatabaseConfig, RetryConfig};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber; `RUST_LOG` overrides `default_level`
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Database settings derived from the service settings
pub fn database_config(settings: &Settings) -> DatabaseConfig {
    let mut config = DatabaseConfig::new(settings.database_url.clone());
    config.max_connections = settings.db_max_connections;
    config.retry = RetryConfig::default().with_max_attempts(settings.db_connect_retries);
    config
}

fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin = origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any))
}

/// Build the application router, adding CORS when an origin is configured
pub fn build_app(settings: &Settings, pool: SqlitePool) -> Result<Router> {
    let app = create_router(AppState::new(pool, settings.clone()));

    match settings.cors_origin.as_deref() {
        Some(origin) => Ok(app.layer(cors_layer(origin)?)),
        None => Ok(app),
    }
}

/// Connect, migrate and serve until Ctrl-C
pub async fn run_server(settings: Settings) -> Result<()> {
    info!(
        "Starting Metatag {} ({} environment)",
        settings.version(),
        settings.app_env
    );

    let pool = init(&database_config(&settings))
        .await
        .context("Failed to initialize database")?;
    let app = build_app(&settings, pool)?;

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", settings.host, settings.port))?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Apply pending migrations and close the pool
pub async fn migrate(settings: &Settings) -> Result<()> {
    let pool = connect(&database_config(settings))
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool).await.context("Failed to run migrations")?;
    pool.close().await;

    info!("Migrations applied to {}", settings.database_url);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
