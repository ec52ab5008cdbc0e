mod auth;
mod completion;
mod config;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod retry;
mod routes;
mod scoring;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::completion::CompletionService;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pipeline::AnalysisPipeline;
use crate::routes::build_router;
use crate::scoring::{Embedder, FastEmbedder, FleschReadability, HttpEmbedder, ScoringEngine};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting keyword-agent v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_api_url.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let completion = CompletionService::new(Arc::new(llm), config.retry, config.llm_timeout);
    info!(
        "Completion retries: {} (base delay {}ms), attempt timeout {}s",
        config.retry.max_retries,
        config.retry.base_delay.as_millis(),
        config.llm_timeout.as_secs()
    );

    let embedder: Arc<dyn Embedder> = match &config.embeddings_api_key {
        Some(key) => {
            info!("Using HTTP embeddings at {}", config.embeddings_url);
            Arc::new(HttpEmbedder::new(
                key.clone(),
                config.embeddings_url.clone(),
                config.llm_timeout,
                config.retry,
            )?)
        }
        None => {
            let cache_dir = config.embeddings_cache_dir.clone();
            info!("Loading local embedding model (cache: {})", cache_dir.display());
            let embedder =
                tokio::task::spawn_blocking(move || FastEmbedder::load(cache_dir)).await??;
            info!("Embedding model loaded");
            Arc::new(embedder)
        }
    };
    let scoring = ScoringEngine::new(embedder, Arc::new(FleschReadability));

    let state = AppState {
        pipeline: Arc::new(AnalysisPipeline::new(completion, scoring)),
        config: config.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
