use plummy_api::{app, config::Config, db::Database, init_tracing, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connections
    let db = Database::connect(&config).await?;
    tracing::info!("Database connections established");

    db.run_migrations().await?;

    let state = AppState::new(db, config.clone())?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
