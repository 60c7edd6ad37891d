//! guardpost server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::http::HeaderValue;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use guardpost::api;
use guardpost::app_state::AppState;
use guardpost::auth::{IdentityVerifier, JwtVerifier};
use guardpost::config::GatewayConfig;
use guardpost::persistence::{MemoryStore, PgStore, Store};
use guardpost::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, "starting guardpost");

    // Build persistence layer
    let store = open_store(&config).await?;

    // Build application state
    let verifier: Arc<dyn IdentityVerifier> = Arc::new(JwtVerifier::new(
        config.jwt_secret.as_bytes(),
        config.jwt_issuer.clone(),
    ));
    let app_state = AppState::new(store, verifier, config.hub);

    // Build router
    let rest = api::build_router().layer(TimeoutLayer::new(Duration::from_secs(
        config.request_timeout_secs,
    )));
    let app = Router::new().merge(rest).route("/ws", get(ws_handler));
    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::openapi::ApiDoc::openapi()),
        )
    };
    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_allowed_origins))
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn open_store(config: &GatewayConfig) -> anyhow::Result<Arc<dyn Store>> {
    if !config.persistence_enabled {
        tracing::warn!("persistence disabled; using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("connecting to PostgreSQL")?;
    let store = PgStore::new(pool);
    if config.run_migrations {
        store.migrate().await.context("running migrations")?;
        tracing::info!("database migrations applied");
    }
    Ok(Arc::new(store))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
