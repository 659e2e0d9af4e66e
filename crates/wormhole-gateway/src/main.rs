mod cli;

use crate::cli::{StorageBackend, CLI};
use clap::Parser;
use tracing::info;
use wormhole_gateway::{App, AppState};
use wormhole_shortener::ShortenerConfig;
use wormhole_storage::{InMemoryRepository, MySqlRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CLI::try_parse()?;
    wormhole_telemetry::init(cli.log_format)?;

    let config = match &cli.config {
        Some(path) => ShortenerConfig::load(path)?,
        None => ShortenerConfig::default(),
    };

    let state = match cli.storage {
        StorageBackend::InMemory => {
            info!("using in-memory storage");
            AppState::from_config(InMemoryRepository::new(), &config)?
        }
        StorageBackend::Mysql => {
            let dsn = cli
                .mysql_dsn
                .as_deref()
                .ok_or("--mysql-dsn is required for mysql storage")?;
            let repository =
                MySqlRepository::connect(dsn, cli.mysql_replica_dsn.as_deref()).await?;
            repository.ensure_schema().await?;
            info!(replica = cli.mysql_replica_dsn.is_some(), "using mysql storage");
            AppState::from_config(repository, &config)?
        }
    };

    let listener = tokio::net::TcpListener::bind(cli.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, server = %config.server, "starting gateway server");

    axum::serve(listener, App::router(state)).await?;

    Ok(())
}
