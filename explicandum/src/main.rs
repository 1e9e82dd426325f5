use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use explicandum::api::{routes::create_router, AppState};
use explicandum::config::Config;
use explicandum::llm::LlmProvider;
use explicandum::retrieval::RetrievalProvider;
use explicandum::store::{MemoryConversationStore, MemoryStanceStore};

#[derive(Parser)]
#[command(name = "explicandum")]
#[command(about = "Multi-persona philosophical reasoning service")]
struct Args {
    /// Override the bind host from EXPLICANDUM_HOST
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port from EXPLICANDUM_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "explicandum=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "EXPLICANDUM_API_KEYS is not set — chat and stance endpoints are locked. Set EXPLICANDUM_API_KEYS to enable them."
        );
    }

    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let llm = LlmProvider::new(config.llm.as_ref());
    if !llm.is_available() {
        tracing::warn!("LLM unavailable - personas and stance extraction will be disabled");
    }

    let retrieval = RetrievalProvider::new(config.retrieval.as_ref());
    if !retrieval.is_available() {
        tracing::info!("Retrieval disabled - personas will answer without supporting context");
    }

    let conversations = Arc::new(MemoryConversationStore::new());
    let stances = Arc::new(MemoryStanceStore::new());

    let state = AppState::new(config.clone(), conversations, stances, retrieval, llm);

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Explicandum starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
