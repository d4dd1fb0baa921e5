mod config;
mod embedding;
mod errors;
mod extraction;
mod matching;
mod models;
mod pipeline;
mod ranking;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::{cache::DEFAULT_TTL, create_embedder, EmbeddingCache, SemanticScorer};
use crate::extraction::PdfTextExtractor;
use crate::matching::SkillVocabulary;
use crate::pipeline::Pipeline;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shortlist API v{}", env!("CARGO_PKG_VERSION"));

    // Embedding model: built once, shared by every request
    let embedder = create_embedder(&config)?;
    info!(
        "Embedding backend initialized ({:?}, model: {})",
        config.embedding_backend,
        embedder.model_name()
    );

    let mut scorer = SemanticScorer::new(embedder);
    if config.embedding_cache_size > 0 {
        scorer = scorer.with_cache(EmbeddingCache::new(config.embedding_cache_size, DEFAULT_TTL));
        info!("Embedding cache enabled ({} entries)", config.embedding_cache_size);
    }

    if let Some(dir) = &config.scratch_dir {
        std::fs::create_dir_all(dir)?;
        info!("Spooling uploads to {}", dir.display());
    }
    let extractor = Arc::new(PdfTextExtractor::new(config.scratch_dir.clone()));

    let vocabulary = SkillVocabulary::with_mode(config.skill_match);
    info!(
        "Skill vocabulary: {} entries, {:?} matching",
        vocabulary.len(),
        vocabulary.mode()
    );

    let pipeline = Pipeline::new(extractor, scorer, vocabulary, config.max_concurrent_documents);
    let state = AppState::new(config.clone(), pipeline);

    // Build router
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
