use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use user_registry::{
    config::Config,
    db,
    repositories::DieselUserRepository,
    services::UserService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("user_registry=info,tower_http=info")),
        )
        .init();

    // Set up database connection pool
    let pool = db::build_pool(&config.database_url, config.pool_size)?;
    db::run_migrations(&pool)?;
    info!(database = %config.database_url, "database ready");

    let users = Arc::new(UserService::new(DieselUserRepository::new(pool)));
    let app = user_registry::app(users, &config.static_dir);

    info!(addr = %config.bind_addr, static_dir = %config.static_dir.display(), "listening");
    axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
