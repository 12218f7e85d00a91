use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use storefront_payments::api::build_router;
use storefront_payments::config::AppConfig;
use storefront_payments::database::memory::InMemoryPaymentStore;
use storefront_payments::database::repository::PaymentStore;
use storefront_payments::health::HealthChecker;
use storefront_payments::logging::init_tracing;
use storefront_payments::payments::HttpVerificationGateway;
use storefront_payments::services::PaymentService;
use tokio::signal;
use tracing::{error, info};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

async fn build_store(config: &AppConfig) -> anyhow::Result<(Arc<dyn PaymentStore>, &'static str)> {
    if config.skip_externals {
        info!("⏭️  Using in-memory payment store (SKIP_EXTERNALS=true)");
        return Ok((Arc::new(InMemoryPaymentStore::new()), "memory"));
    }

    #[cfg(feature = "database")]
    {
        use storefront_payments::database::payment_repository::PgPaymentRepository;
        use storefront_payments::database::{init_pool_from_config, run_migrations};

        let db_config = config
            .database
            .as_ref()
            .context("DATABASE_URL not set")?;

        info!("📊 Initializing database connection pool...");
        let pool = init_pool_from_config(db_config).await?;
        run_migrations(&pool).await?;
        info!(
            max_connections = pool.options().get_max_connections(),
            "✅ Database connection pool initialized"
        );

        return Ok((Arc::new(PgPaymentRepository::new(pool)), "database"));
    }

    #[cfg(not(feature = "database"))]
    anyhow::bail!("built without the `database` feature; set SKIP_EXTERNALS=true")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        skip_externals = config.skip_externals,
        "🚀 Starting storefront payments service"
    );

    let (store, store_name) = build_store(&config).await?;

    let gateway = Arc::new(HttpVerificationGateway::new(&config.redirect_wallet)?);
    let payment_service = Arc::new(PaymentService::new(
        store.clone(),
        gateway,
        config.redirect_wallet.clone(),
    ));
    let health_checker = HealthChecker::new(store, store_name);

    let app = build_router(payment_service, health_checker);
    info!("✅ Routes configured");

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .context("invalid SERVER_HOST/SERVER_PORT")?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!(address = %addr, error = %e, "❌ Failed to bind");
        e
    })?;

    info!(address = %addr, "🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");

    Ok(())
}
