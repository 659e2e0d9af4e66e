use crate::config::ShortenerConfig;
use wormhole_core::{Protocol, UrlParts};

/// Canonicalizes URLs before they are hashed and stored.
///
/// The output always uses `http://`; the redirector converts it back to the
/// scheme of the incoming request. Nothing is percent-decoded or re-encoded
/// apart from literal spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    article_path: Option<String>,
    script_path: String,
}

impl Normalizer {
    pub fn new(article_path: Option<String>, script_path: impl Into<String>) -> Self {
        Self {
            article_path,
            script_path: script_path.into(),
        }
    }

    pub fn from_config(config: &ShortenerConfig) -> Self {
        Self::new(config.article_path.clone(), config.script_path.clone())
    }

    pub fn normalize(&self, url: &str) -> String {
        let url = url.trim().replace(' ', "%20");
        let parts = UrlParts::parse(&url);

        let article = self.article_url_path(&parts);
        let parts = match article.as_deref() {
            Some(path) => UrlParts {
                path,
                query: None,
                ..parts
            },
            None => parts,
        };

        let parts = if parts.path.is_empty() {
            UrlParts { path: "/", ..parts }
        } else {
            parts
        };

        parts.assemble(Protocol::Http)
    }

    /// The pretty path for a `script?title=X` request, if it is exactly that.
    fn article_url_path(&self, parts: &UrlParts<'_>) -> Option<String> {
        let article_path = self.article_path.as_deref()?;
        if parts.path != self.script_path {
            return None;
        }

        let mut params = parts.query?.split('&').filter(|param| !param.is_empty());
        let only = params.next()?;
        if params.next().is_some() {
            return None;
        }

        let (name, title) = only.split_once('=')?;
        if name != "title" || title.is_empty() {
            return None;
        }

        Some(article_path.replace("$1", title))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&ShortenerConfig::default())
    }
}
