mod config;
mod consistency;
mod db;
mod derivation;
mod errors;
mod filters;
mod models;
mod payload;
mod routes;
mod services;
mod state;
mod store;
mod uploads;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{PgStore, Store};
use crate::uploads::{FileStorage, LocalStorage, S3Storage};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobtracker v{}", env!("CARGO_PKG_VERSION"));

    let store = match &config.database_url {
        Some(url) => Store::Postgres(PgStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store (data is lost on exit)");
            Store::in_memory()
        }
    };

    let files: Arc<dyn FileStorage> = match &config.s3 {
        Some(s3) => Arc::new(S3Storage::connect(s3).await),
        None => {
            info!("Storing uploads under {}", config.upload_dir);
            Arc::new(LocalStorage::new(&config.upload_dir))
        }
    };

    let cors = cors_layer(config.cors_allow_origin.as_deref())?;
    let port = config.port;

    let state = AppState {
        store,
        files,
        config,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Permissive when no origins are configured, otherwise restricted to the list.
fn cors_layer(allow_origin: Option<&str>) -> Result<CorsLayer> {
    let Some(origins) = allow_origin else {
        return Ok(CorsLayer::permissive());
    };
    let origins = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("CORS_ALLOW_ORIGIN has an invalid origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}
