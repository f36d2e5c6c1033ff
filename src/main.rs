use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use proposals_api::infrastructure::{
    database,
    logging::{init_logging, LoggingConfig},
    shutdown::shutdown_signal,
};
use proposals_api::{
    create_router, AppConfig, PgProposalRepository, ProposalRepositoryTrait, ProposalService,
    RateLimiter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let _log_guard = init_logging(LoggingConfig::with_log_dir(config.log_dir.clone()))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting proposals API");

    // Without a database there is nothing to serve.
    let pool = match database::connect_database(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Connection error: {}", e);
            return Err(e).context("Database startup failed");
        }
    };

    let repository: Arc<dyn ProposalRepositoryTrait> =
        Arc::new(PgProposalRepository::new(pool.clone()));
    let service = ProposalService::new(repository);

    let limiter = RateLimiter::new(config.rate_limit.clone());
    let purge_handle = limiter.spawn_purge_task();

    let app = create_router(service, limiter);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server is running on http://localhost:{}", config.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    purge_handle.abort();
    pool.close().await;
    info!("Server stopped");

    Ok(())
}
