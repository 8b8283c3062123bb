mod config;
mod db;
mod llm;
mod models;
mod rate_limit;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::llm::LlmChat;
use crate::services::affiliate::AffiliateResolver;
use crate::store::{DocumentStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");

    let store: Arc<dyn DocumentStore> = match &config.store {
        StoreBackend::Postgres { database_url, max_connections } => {
            let pool = db::connect(database_url, *max_connections)
                .await
                .expect("database init failed");
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Suggestions are optional: run without them when the LLM is not configured.
    let llm: Option<Arc<dyn LlmChat>> = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "llm client ready");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "llm not configured; suggestions disabled");
            None
        }
    };

    let links = AffiliateResolver::new(config.affiliate_tag.clone()).expect("http client init failed");

    let port = config.port;
    let state = state::AppState::new(store, llm, Arc::new(links), config);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "wishlist listening");
    axum::serve(listener, app).await.expect("server failed");
}
