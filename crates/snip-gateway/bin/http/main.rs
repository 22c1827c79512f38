mod cli;

use crate::cli::{LogFormat, CLI};
use anyhow::Context;
use clap::Parser;
use snip_gateway::{App, AppState, JwtIdentity};
use snip_shortener::ShortenerService;
use snip_storage::{
    InMemoryRepository, Journal, PostgresRepository, Repository, StorageKind,
};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    let storage = StorageKind::select(
        config.database_dsn.as_deref(),
        Some(Path::new(&config.file_storage_path)),
    );

    info!(
        server_address = %config.server_address,
        base_url = %config.base_url,
        storage_backend = %storage,
        "starting snip server"
    );

    match storage {
        StorageKind::Postgres { dsn } => {
            let repository =
                PostgresRepository::connect(&dsn, config.deletion_queue_capacity)
                    .await
                    .context("failed to connect to postgres")?;
            run_server(&config, repository).await
        }
        StorageKind::Journaled { path } => {
            let journal = Journal::open(&path)
                .await
                .with_context(|| format!("failed to open journal {}", path.display()))?;
            run_server(&config, InMemoryRepository::with_journal(journal)).await
        }
        StorageKind::Volatile => run_server(&config, InMemoryRepository::new()).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn run_server<R: Repository>(config: &CLI, repository: R) -> anyhow::Result<()> {
    let repository = Arc::new(repository);
    repository
        .init()
        .await
        .context("failed to initialize storage")?;

    let service = ShortenerService::from_shared(Arc::clone(&repository));
    let state = AppState::new(
        Arc::new(service),
        config.base_url.as_str(),
        JwtIdentity::new(&config.jwt_secret),
    );

    let listener = TcpListener::bind(config.server_address).await?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    let served = axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    repository.close().await.context("failed to close storage")?;
    info!("snip server stopped");

    Ok(served?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
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

    info!("shutdown signal received");
}
