use std::sync::Arc;

use anyhow::Context;
use tracing::{Level, info};

use server::config::AppConfig;
use server::database::init_db;
use server::generation::OpenAiCompatibleGenerator;
use server::seed;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    seed::seed_defaults(&db).await?;
    seed::ensure_indexes(&db).await?;
    seed::seed_admin(&db, &config.seed).await?;

    let generator = OpenAiCompatibleGenerator::new(&config.generation)
        .context("Failed to build generation client")?;
    if config.generation.api_key.is_empty() {
        tracing::warn!("generation.api_key is empty, upstream calls will likely be rejected");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        generator: Arc::new(generator),
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
