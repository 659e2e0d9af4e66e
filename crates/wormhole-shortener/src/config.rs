use crate::error::ConfigLoadError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use typed_builder::TypedBuilder;
use url::Url;
use wormhole_core::{CodecSettings, Protocol, ShortUrlTemplate};

pub const DEFAULT_SERVER: &str = "http://localhost";
pub const DEFAULT_URL_TEMPLATE: &str = "/$1";
pub const DEFAULT_URL_SIZE_LIMIT: usize = 2000;
pub const DEFAULT_SCRIPT_PATH: &str = "/index.php";

/// Deployment configuration for the shortener.
///
/// Every key is optional in the TOML file; missing ones take the defaults
/// below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct ShortenerConfig {
    /// Canonical URL of this deployment, e.g. `https://example.org`.
    #[builder(default = DEFAULT_SERVER.to_string(), setter(into))]
    pub server: String,
    /// Server the short URLs are served from. Falls back to `server`.
    #[builder(default, setter(strip_option, into))]
    pub short_server: Option<String>,
    /// Path of a short URL, `$1` is replaced by the code.
    #[builder(default = DEFAULT_URL_TEMPLATE.to_string(), setter(into))]
    pub url_template: String,
    #[builder(default)]
    pub codec: CodecSettings,
    /// Host patterns that may be shortened. Falls back to the server's own host.
    #[builder(default, setter(strip_option))]
    pub allowed_domains: Option<Vec<String>>,
    #[builder(default)]
    pub allow_arbitrary_ports: bool,
    #[builder(default = DEFAULT_URL_SIZE_LIMIT)]
    pub url_size_limit: usize,
    /// Pretty article path such as `/wiki/$1`.
    #[builder(default, setter(strip_option, into))]
    pub article_path: Option<String>,
    #[builder(default = DEFAULT_SCRIPT_PATH.to_string(), setter(into))]
    pub script_path: String,
    #[builder(default)]
    pub read_only: bool,
    #[builder(default, setter(strip_option))]
    pub rate_limit: Option<RateLimitSettings>,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Fixed-window rate limit applied per requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl ShortenerConfig {
    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml::from_str(raw)?)
    }

    /// Template for the fully qualified short URLs handed to users.
    pub fn short_url_template(&self) -> ShortUrlTemplate {
        let server = self.short_server.as_deref().unwrap_or(&self.server);
        ShortUrlTemplate::new(server, &self.url_template)
    }

    /// Protocol stored URLs are expanded to when exported.
    pub fn canonical_protocol(&self) -> Protocol {
        match Protocol::of_url(&self.server) {
            Protocol::Relative => Protocol::Http,
            protocol => protocol,
        }
    }

    /// Host and effective port of the canonical server.
    pub fn server_authority(&self) -> Result<(String, u16), ConfigLoadError> {
        let invalid = || ConfigLoadError::InvalidServer(self.server.clone());
        let parsed = parse_with_default_scheme(&self.server).map_err(|_| invalid())?;
        let host = parsed.host_str().ok_or_else(invalid)?.to_string();
        let port = parsed.port_or_known_default().ok_or_else(invalid)?;
        Ok((host, port))
    }
}

/// Parses `url`, reading a protocol-relative `//host` as `http:`.
pub(crate) fn parse_with_default_scheme(url: &str) -> Result<Url, url::ParseError> {
    if url.starts_with("//") {
        Url::parse(&format!("http:{url}"))
    } else {
        Url::parse(url)
    }
}
