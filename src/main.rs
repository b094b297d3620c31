use anyhow::Context;
use tracing_subscriber::EnvFilter;
use axum_traffic_predict::{build_router, config::Config, inference::ModelSet, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Models are loaded once; a missing or malformed artifact stops startup
    let models = ModelSet::load(&config.models).context("Failed to load prediction models")?;

    tracing::info!("Credential store: {}", config.auth.users_file.display());
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_router(AppState::new(config, models));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server running on {}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;
    Ok(())
}
