use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use lectern_core::config_file;
use lectern_core::provider::{ProviderKind, build_bible_provider};
use lectern_core::{CitationEngine, CorpusIndex};
use tower_http::cors::CorsLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod handlers;
mod models;
mod state;

use state::AppState;

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/citation/lookup", post(handlers::lookup::lookup))
        .route("/api/citation/health", get(handlers::health::health))
        .route("/api/citation/engine-info", get(handlers::info::engine_info))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build the engine from the config file and `LECTERN_*` environment variables.
fn build_engine() -> anyhow::Result<(CitationEngine, PathBuf)> {
    let file = config_file::load_config();

    let corpus_path = std::env::var("LECTERN_CORPUS")
        .ok()
        .map(PathBuf::from)
        .or_else(|| file.corpus_path())
        .context("No corpus directory configured. Set LECTERN_CORPUS or [corpus] path in .lectern.toml")?;
    if !corpus_path.is_dir() {
        anyhow::bail!("Corpus directory not found: {}", corpus_path.display());
    }
    let corpus = if file.scan() {
        CorpusIndex::scan_dir(&corpus_path)
    } else {
        CorpusIndex::load(&corpus_path)
    }
    .with_context(|| format!("failed to load corpus at {}", corpus_path.display()))?;

    let mut config = file.to_config().context("invalid configuration file")?;
    if let Some(secs) = std::env::var("LECTERN_TIMEOUT")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
    {
        config.provider_timeout_secs = secs;
    }

    let mut settings = file
        .provider_settings()
        .context("invalid [bible] configuration")?;
    if let Ok(name) = std::env::var("LECTERN_PROVIDER") {
        settings.kind = name.parse::<ProviderKind>().map_err(anyhow::Error::msg)?;
    }
    if let Ok(url) = std::env::var("LECTERN_BIBLE_URL") {
        settings.base_url = Some(url);
    }
    settings.timeout = Some(Duration::from_secs(config.provider_timeout_secs));

    let mut engine = CitationEngine::new(Arc::new(corpus), config);
    match build_bible_provider(&settings) {
        Ok(Some(provider)) => engine = engine.with_provider(provider),
        Ok(None) => tracing::info!("biblical lookups disabled"),
        Err(e) => tracing::warn!("bible provider unavailable, biblical lookups disabled: {e}"),
    }
    Ok((engine, corpus_path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (engine, corpus_path) = build_engine()?;
    tracing::info!(
        corpus = %corpus_path.display(),
        works = engine.corpus().len(),
        "engine ready"
    );

    let state = Arc::new(AppState {
        engine,
        corpus_path: Some(corpus_path),
    });

    let addr: SocketAddr = std::env::var("LECTERN_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:5000".to_string())
        .parse()
        .context("LECTERN_ADDR is not a socket address")?;
    tracing::info!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
