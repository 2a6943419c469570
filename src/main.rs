use manatomb::{config::Config, db, routes::build_router, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config)?;

    if let Err(e) = db::run_migrations(&state.db).await {
        tracing::error!("❌ Failed to apply database schema: {}", e);
        return Err(e.into());
    }

    let app = build_router(state);

    tracing::info!("🚀 Server listening on http://{}", config.bind_addr);
    tracing::info!("✅ All systems operational");

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
