//! crawlforge - background crawl-and-embed worker.
//!
//! Claims crawl jobs from the store, fetches and indexes pages, and keeps
//! discovered-link suggestions embedded for a retrieval-augmented document
//! graph.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crawlforge::config::Config;
use crawlforge::fetch::HttpFetcher;
use crawlforge::indexer::EmbeddingClient;
use crawlforge::scheduler;
use crawlforge::StoreGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crawlforge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let store = StoreGateway::connect(&config.store_url).await?;
    let fetcher = HttpFetcher::new();
    let embedder = EmbeddingClient::new(
        config.embeddings_credential.clone(),
        config.embeddings_base_url.clone(),
        config.embeddings_model.clone(),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(());
    });

    scheduler::run(
        store,
        fetcher,
        embedder,
        config.max_concurrent_jobs,
        config.fallback_poll_ms,
        shutdown_rx,
    )
    .await;

    Ok(())
}
