mod analysis;
mod auth;
mod config;
mod credits;
mod db;
mod errors;
mod files;
mod history;
mod llm_client;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::analyzer::GeminiAnalyzer;
use crate::auth::provider::GoTrueClient;
use crate::auth::token::TokenVerifier;
use crate::config::Config;
use crate::credits::ledger::PgCreditLedger;
use crate::db::create_pool;
use crate::history::repository::PgAnalysisRepository;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Kairos API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());

    // Initialize auth provider client
    let auth = GoTrueClient::new(&config.supabase_url, config.supabase_anon_key.clone())?;
    info!("Auth provider client initialized ({})", config.supabase_url);

    info!(
        "New credit accounts start with {} credits",
        config.default_credits
    );

    // Build app state
    let state = AppState {
        analyzer: Arc::new(GeminiAnalyzer(llm)),
        analyses: Arc::new(PgAnalysisRepository::new(db.clone())),
        credits: Arc::new(PgCreditLedger::new(db, config.default_credits)),
        auth: Arc::new(auth),
        tokens: TokenVerifier::new(&config.supabase_jwt_secret),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
