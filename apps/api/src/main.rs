mod chat;
mod config;
mod db;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::executor::PgQueryExecutor;
use crate::chat::schema::SchemaSource;
use crate::chat::service::ChatService;
use crate::chat::store::PgChatStore;
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "sqlchat", version, about = "Ask questions about customer sales data")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Replace the contents of customer_data with rows from a CSV file.
    LoadCustomers {
        #[arg(long, value_name = "FILE", default_value = "data/static/clustered_customers.csv")]
        csv: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, db).await,
        Command::LoadCustomers { csv } => {
            ingest::load_customers(&db, &csv).await?;
            Ok(())
        }
    }
}

async fn serve(config: Config, db: sqlx::PgPool) -> Result<()> {
    info!("Starting sqlchat v{}", env!("CARGO_PKG_VERSION"));

    if config.anthropic_api_key.is_none() {
        warn!("ANTHROPIC_API_KEY is not set! Chat requests will fail until it is configured");
    }

    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.anthropic_api_url.clone(),
        &config.chat,
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    let schema = SchemaSource::new(&config.schema_path);
    info!("Reading table schema from {}", schema.path().display());

    let store = Arc::new(PgChatStore::new(db.clone()));
    let chat = ChatService::new(
        store.clone(),
        Arc::new(PgQueryExecutor::new(db)),
        Arc::new(llm),
        schema,
        config.chat.persona.clone(),
    );

    let state = AppState {
        chat: Arc::new(chat),
        store,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
