use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use sqlx::migrate::Migrator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealer_core::adapters::{PostgresAuditSink, PostgresStore};
use dealer_core::ports::{AuditSink, DealershipStore};
use dealer_core::services::TransactionLifecycleService;
use dealer_core::{config, create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database pool
    let pool = db::create_pool(&config).await?;

    // Run migrations
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    let store: Arc<dyn DealershipStore> = Arc::new(PostgresStore::new(pool.clone()));
    let audit: Arc<dyn AuditSink> = Arc::new(PostgresAuditSink::new(pool));
    let lifecycle = Arc::new(TransactionLifecycleService::new(store, audit));

    let app = create_app(AppState { lifecycle });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
