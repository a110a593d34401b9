//! primerwatch web server
//!
//! Run with: cargo run -p primerwatch-web

use tracing::info;
use tracing_subscriber::EnvFilter;

use primerwatch_config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("primerwatch=debug,info")),
        )
        .init();

    info!("Starting primerwatch web server...");

    let config = Config::load()?;
    info!(backend = %config.backend.url, "configuration loaded");
    let bind = config.server.bind.clone();

    // Create app state
    let state = primerwatch_web::state::AppState::connect(config)?;

    // Build router
    let app = primerwatch_web::router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("🚀 Server listening on http://{}", listener.local_addr()?);
    info!("📱 Open your browser and sign in at http://{}/login", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
