mod backend;
mod config;
mod error;
mod middleware;
mod models;
mod query;
mod roles;
mod routes;
mod wizard;

use std::sync::Arc;
use std::time::Duration;

use crate::{backend::http::HttpBackend, config::Config, models::AppState};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let backend = HttpBackend::new(&cfg.backend_url, Duration::from_secs(cfg.backend_timeout_secs))?;
    tracing::info!(backend = backend.base_url(), "using Cuidate backend");

    let state = AppState {
        backend: Arc::new(backend),
        page_sizes: cfg.page_sizes,
    };

    // The browser console is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
