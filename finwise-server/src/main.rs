mod protocol;
mod server;
mod handler;
mod delivery;
mod config;
mod error;
mod interaction_log;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use finwise_advisor::{GeminiCompletion, GeminiConfig, GenerationGateway};
use finwise_market_data::{ErApiForexProvider, PolygonIndexProvider, SnapshotCache, SystemClock};

use config::ServerConfig;
use handler::ChatPipeline;
use interaction_log::InteractionLogger;
use server::AppState;

#[derive(Parser)]
#[command(name = "finwise-server")]
#[command(about = "HTTP relay between the FinWise web client and the Gemini advisor")]
struct Cli {
    /// Server host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to bind to
    #[arg(long, default_value = "9000")]
    port: u16,

    /// Seconds a market snapshot stays fresh before a refetch
    #[arg(long, default_value = "300")]
    cache_ttl_secs: u64,

    /// Characters per streamed chunk
    #[arg(long, default_value = "50")]
    chunk_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "finwise_server={},finwise_market_data={},finwise_advisor={}",
                cli.log_level, cli.log_level, cli.log_level
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let google_api_key = std::env::var("GOOGLE_API_KEY")
        .context("GOOGLE_API_KEY is not set; add it to the environment or a .env file")?;
    let polygon_api_key = std::env::var("POLYGON_API_KEY").unwrap_or_default();
    if polygon_api_key.is_empty() {
        tracing::warn!("POLYGON_API_KEY is not set; index quotes will fall back to static values");
    }
    let interaction_log_dir = std::env::var("FINWISE_INTERACTION_LOG_DIR")
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from);

    tracing::info!("🚀 FinWise Advisor Server Starting");
    tracing::info!("Configuration:");
    tracing::info!("  Host: {}", cli.host);
    tracing::info!("  Port: {}", cli.port);
    tracing::info!("  Market cache TTL: {}s", cli.cache_ttl_secs);
    tracing::info!("  Stream chunk size: {} chars", cli.chunk_size);
    tracing::info!(
        "  Interaction log: {}",
        interaction_log_dir
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| "disabled".to_string())
    );

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        cache_ttl_secs: cli.cache_ttl_secs,
        chunk_size: cli.chunk_size,
        interaction_log_dir,
    };

    let cache = Arc::new(SnapshotCache::new(
        Arc::new(PolygonIndexProvider::new(polygon_api_key)),
        Arc::new(ErApiForexProvider::new()),
        Arc::new(SystemClock),
        Duration::from_secs(config.cache_ttl_secs),
    ));
    let completion = GeminiCompletion::new(GeminiConfig::default(), google_api_key);
    let gateway = Arc::new(GenerationGateway::new(Arc::new(completion)));
    let state = AppState {
        pipeline: Arc::new(ChatPipeline::new(Arc::clone(&cache), gateway)),
        cache,
        logger: Arc::new(InteractionLogger::new(config.interaction_log_dir.clone())),
        chunk_size: config.chunk_size,
    };

    server::run(config, state).await?;

    Ok(())
}
