use crate::config::{parse_with_default_scheme, ShortenerConfig};
use crate::error::{ConfigLoadError, ValidationError};
use regex::RegexSet;
use wormhole_core::UrlParts;

/// Decides whether a URL may be shortened at all.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    allowed: RegexSet,
    own_host: String,
    own_port: u16,
    allow_arbitrary_ports: bool,
}

impl ValidationPolicy {
    /// Builds the policy for a deployment.
    ///
    /// Each pattern must match the whole host. Without patterns only the
    /// server's own host is accepted.
    pub fn new(
        config: &ShortenerConfig,
        patterns: Option<&[String]>,
    ) -> Result<Self, ConfigLoadError> {
        let (own_host, own_port) = config.server_authority()?;

        let anchored: Vec<String> = match patterns {
            Some(patterns) => patterns.iter().map(|p| format!("^(?:{p})$")).collect(),
            None => vec![format!("^{}$", regex::escape(&own_host))],
        };

        Ok(Self {
            allowed: RegexSet::new(anchored)?,
            own_host,
            own_port,
            allow_arbitrary_ports: config.allow_arbitrary_ports,
        })
    }

    pub fn from_config(config: &ShortenerConfig) -> Result<Self, ConfigLoadError> {
        Self::new(config, config.allowed_domains.as_deref())
    }

    pub fn validate(&self, url: &str) -> Result<(), ValidationError> {
        let url = url.trim();
        let parsed = parse_with_default_scheme(url)
            .map_err(|e| ValidationError::MalformedUrl(e.to_string()))?;
        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ValidationError::MalformedUrl("url has no host".to_string()))?;

        check_stored_authority(UrlParts::parse(url).authority)?;

        // `port()` is None when the port is the scheme's default
        if let Some(port) = parsed.port() {
            let standard = port == 80 || port == 443;
            let own = host == self.own_host && port == self.own_port;
            if !self.allow_arbitrary_ports && !standard && !own {
                return Err(ValidationError::DisallowedPort(port));
            }
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(ValidationError::CredentialsPresent);
        }

        if !self.allowed.is_match(host) {
            return Err(ValidationError::DisallowedDomain {
                host: host.to_string(),
            });
        }

        Ok(())
    }
}

/// The authority is stored and redirected to verbatim, so it must not read
/// differently to parsers more lenient than the one the host was taken from.
fn check_stored_authority(authority: &str) -> Result<(), ValidationError> {
    if authority.contains('@') {
        return Err(ValidationError::CredentialsPresent);
    }
    if let Some(c) = authority
        .chars()
        .find(|c| *c == '\\' || c.is_whitespace() || c.is_control())
    {
        return Err(ValidationError::MalformedUrl(format!(
            "authority contains {c:?}"
        )));
    }
    Ok(())
}
