mod cli;

use crate::cli::CLI;
use clap::Parser;
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tracing::info;
use wormhole_core::IdCodec;
use wormhole_shortener::{Exporter, ShortenerConfig};
use wormhole_storage::MySqlRepository;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CLI::try_parse()?;
    wormhole_telemetry::init(cli.log_format)?;

    let config = match &cli.config {
        Some(path) => ShortenerConfig::load(path)?,
        None => ShortenerConfig::default(),
    };
    let codec = IdCodec::new(config.codec.clone())?;
    let repository =
        MySqlRepository::connect(&cli.mysql_dsn, cli.mysql_replica_dsn.as_deref()).await?;

    let exporter = Exporter::new(Arc::new(repository), Arc::new(codec))
        .with_protocol(config.canonical_protocol())
        .with_batch_size(cli.batch_size);

    let mut out: Box<dyn AsyncWrite + Unpin + Send> = match &cli.output {
        Some(path) => Box::new(tokio::fs::File::create(path).await?),
        None => Box::new(tokio::io::stdout()),
    };

    let written = exporter.write_all(&mut out).await?;
    info!(written, "dump complete");

    Ok(())
}
