//! loreqa - hybrid wiki QA service with knowledge-graph curation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loreqa_core::{AnswerOrchestrator, Config, CurationService};
use loreqa_graph::{GraphClient, GraphSandbox, Neo4jCurationStore, PatternFactFetcher};
use loreqa_retrieval::{EmbeddingClient, HybridRetriever, LexicalClient, RerankClient, VectorStore};
use loreqa_web::state::AppState;

#[derive(Parser)]
#[command(name = "loreqa", about = "Hybrid wiki QA with knowledge-graph curation", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the QA HTTP service
    Serve {
        /// Bind address (overrides QA_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides QA_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "loreqa=info,tower_http=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let lexical = LexicalClient::new(&config.search.url, &config.search.index);
    let embedding = EmbeddingClient::new(
        &config.vector.embedding_url,
        &config.vector.embedding_model,
    );
    let vector = VectorStore::new(&config.vector.qdrant_url, &config.vector.collection)?;
    let rerank = config.vector.rerank_url.as_deref().map(RerankClient::new);
    let retriever = Arc::new(HybridRetriever::new(lexical, embedding, vector, rerank));

    let graph = tokio::time::timeout(
        Duration::from_secs(10),
        GraphClient::connect(&config.graph),
    )
    .await
    .context("Timed out connecting to Neo4j")??;

    let facts = Arc::new(PatternFactFetcher::new(graph.clone()));
    let orchestrator = Arc::new(AnswerOrchestrator::new(
        retriever,
        facts,
        config.max_top_k,
        config.answer_timeout,
    ));
    let sandbox = Arc::new(GraphSandbox::new(
        graph.clone(),
        config.sandbox_max_rows,
        config.sandbox_timeout,
    ));
    let store = Arc::new(Neo4jCurationStore::new(graph));
    let curation = Arc::new(CurationService::new(store, config.admin_token.clone()));

    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN is not set; curation endpoints will refuse all calls");
    }

    let state = AppState::new(orchestrator, sandbox, curation);
    let host = host.unwrap_or_else(|| config.host.clone());
    let port = port.unwrap_or(config.port);

    loreqa_web::run_server(state, &host, port).await
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await,
    }
}
