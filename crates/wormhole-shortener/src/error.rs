use std::path::PathBuf;
use thiserror::Error;
use wormhole_core::{ConfigError, DecodeError, ShortCode, StorageError};

pub type Result<T> = std::result::Result<T, ShortenerError>;

/// Why a URL was refused by the validation policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed url: {0}")]
    MalformedUrl(String),
    #[error("port {0} is not allowed")]
    DisallowedPort(u16),
    #[error("urls containing a username or password are not allowed")]
    CredentialsPresent,
    #[error("urls on {host} are not allowed")]
    DisallowedDomain { host: String },
}

impl ValidationError {
    /// Stable machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MalformedUrl(_) => "malformed_url",
            ValidationError::DisallowedPort(_) => "disallowed_port",
            ValidationError::CredentialsPresent => "credentials_present",
            ValidationError::DisallowedDomain { .. } => "disallowed_domain",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("url is longer than {limit} characters")]
    UrlTooLong { limit: usize },
    #[error("too many requests, try again later")]
    RateLimited,
    #[error("the service is in read-only mode")]
    ReadOnly,
    #[error("requester is blocked")]
    Blocked,
    #[error("short code {0} has been deleted")]
    Deleted(ShortCode),
    #[error("short code not found")]
    NotFound,
    #[error("invalid short code: {0}")]
    DecodeInvalid(#[from] DecodeError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ShortenerError {
    /// Stable machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            ShortenerError::Validation(err) => err.kind(),
            ShortenerError::UrlTooLong { .. } => "url_too_long",
            ShortenerError::RateLimited => "rate_limited",
            ShortenerError::ReadOnly => "read_only",
            ShortenerError::Blocked => "blocked",
            ShortenerError::Deleted(_) => "deleted",
            ShortenerError::NotFound => "not_found",
            ShortenerError::DecodeInvalid(_) => "invalid_code",
            ShortenerError::Storage(_) => "storage",
        }
    }
}

/// Problems turning a configuration file into running components.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid codec settings: {0}")]
    Codec(#[from] ConfigError),
    #[error("invalid domain pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("invalid server url {0:?}")]
    InvalidServer(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}
