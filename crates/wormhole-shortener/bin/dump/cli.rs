use clap::Parser;
use std::path::PathBuf;
use wormhole_shortener::export::DEFAULT_BATCH_SIZE;
use wormhole_telemetry::LogFormat;

pub const CONFIG_PATH_ENV: &str = "WORMHOLE_CONFIG";
pub const MYSQL_DSN_ENV: &str = "WORMHOLE_MYSQL_DSN";
pub const MYSQL_REPLICA_DSN_ENV: &str = "WORMHOLE_MYSQL_REPLICA_DSN";
pub const LOG_FORMAT_ENV: &str = "WORMHOLE_LOG_FORMAT";

/// Writes every active short URL as `code|url`, one per line.
#[derive(Debug, Parser)]
#[command(name = "wormhole-dump")]
pub struct CLI {
    /// TOML config; defaults apply when omitted.
    #[arg(long, env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    #[arg(long, env = MYSQL_DSN_ENV)]
    pub mysql_dsn: String,

    /// Read from a replica instead of the primary.
    #[arg(long, env = MYSQL_REPLICA_DSN_ENV)]
    pub mysql_replica_dsn: Option<String>,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Output file. Standard output when omitted.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}
