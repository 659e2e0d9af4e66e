use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use wormhole_telemetry::LogFormat;

pub const LISTEN_ADDR_ENV: &str = "WORMHOLE_GATEWAY_LISTEN_ADDR";
pub const CONFIG_PATH_ENV: &str = "WORMHOLE_CONFIG";
pub const STORAGE_ENV: &str = "WORMHOLE_STORAGE";
pub const MYSQL_DSN_ENV: &str = "WORMHOLE_MYSQL_DSN";
pub const MYSQL_REPLICA_DSN_ENV: &str = "WORMHOLE_MYSQL_REPLICA_DSN";
pub const LOG_FORMAT_ENV: &str = "WORMHOLE_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// Process-local store, lost on restart.
    InMemory,
    Mysql,
}

#[derive(Debug, Parser)]
#[command(name = "wormhole-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = "127.0.0.1:8080")]
    pub listen_addr: SocketAddr,

    /// TOML config; defaults apply when omitted.
    #[arg(long, env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    #[arg(long, env = STORAGE_ENV, value_enum, default_value_t = StorageBackend::InMemory)]
    pub storage: StorageBackend,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    /// Reads go here when set; writes always use the primary.
    #[arg(long, env = MYSQL_REPLICA_DSN_ENV)]
    pub mysql_replica_dsn: Option<String>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}
