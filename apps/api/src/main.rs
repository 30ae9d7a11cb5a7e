mod assist;
mod config;
mod errors;
mod llm_client;
mod models;
mod render;
mod routes;
mod state;
mod steps;
mod storage;
mod wizard;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assist::InFlight;
use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::render::layout::default_page_config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::FileStore;
use crate::wizard::RecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let crate_name = env!("CARGO_PKG_NAME").replace('-', "_");
            EnvFilter::new(format!("{crate_name}={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Coach API v{}", env!("CARGO_PKG_VERSION"));

    // Restore any saved session from the data directory
    let file_store = FileStore::new(&config.data_dir);
    let restored = file_store.load().await;
    if restored.is_some() {
        info!("Found a saved session");
    }
    let store = RecordStore::new(restored, file_store);

    let llm = GeminiClient::new(config.gemini_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let page_config = default_page_config();

    let state = AppState {
        store,
        llm: Arc::new(llm),
        flights: Arc::new(InFlight::default()),
        config: config.clone(),
        page_config,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // single-user local service

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
