pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod listing;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::{CloudinaryClient, ImageHost, SearchClient};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub media: Arc<dyn ImageHost>,
    pub search: SearchClient,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> anyhow::Result<Self> {
        let media = CloudinaryClient::new(config.cloudinary.clone(), config.http.timeout_secs)?;
        let search = SearchClient::new(config.tavily.clone(), config.http.timeout_secs)?;
        Ok(Self {
            db,
            config,
            media: Arc::new(media),
            search,
        })
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api::routes(state.clone()))
        .layer(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// `RUST_LOG` filter, plain or JSON (`LOG_FORMAT=json`) output.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "plummy_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
