use std::net::SocketAddr;

use anyhow::Result;
use coachdesk::api::{create_routes, AppState};
use coachdesk::config::{init_tracing, run_migrations, AppConfig, DatabaseConfig};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.log_level);

    let db_config = DatabaseConfig::from_env()?;
    let pool = db_config.create_pool().await?;
    run_migrations(&pool).await?;

    let state = AppState::new(pool, &config);
    let app = create_routes(state, &config);

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!(environment = %config.environment, "coachdesk listening on http://{}", address);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
