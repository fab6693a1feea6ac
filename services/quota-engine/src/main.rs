use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use thetai_quota_engine::api::{self, ApiState};
use thetai_quota_engine::config::QuotaEngineConfig;
use thetai_quota_engine::quota::QuotaManager;
use thetai_quota_engine::storage::QuotaDatabase;
use thetai_quota_engine::wallet::WalletManager;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = QuotaEngineConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config);

    info!(
        host = %config.server_host,
        port = config.server_port,
        data_dir = %config.data_dir.display(),
        "starting quota-engine service"
    );

    let database = Arc::new(QuotaDatabase::new(config.data_dir.clone())?);
    let quota = Arc::new(QuotaManager::new(Arc::clone(&database)));
    let wallet = Arc::new(WalletManager::new(Arc::clone(&database), &config));

    let state = Arc::new(ApiState::new(quota, wallet, config.clone()));
    let router = api::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid server bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;
    let local_addr = listener
        .local_addr()
        .context("failed to read bound address")?;
    info!(%local_addr, "quota-engine listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server encountered an unrecoverable error")?;

    info!("quota-engine shutdown complete");
    Ok(())
}

fn init_tracing(config: &QuotaEngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
