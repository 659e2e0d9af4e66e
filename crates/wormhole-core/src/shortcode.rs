use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A short code as produced by [`IdCodec`][crate::codec::IdCodec].
///
/// Holding a `ShortCode` does not imply the code is resolvable; it is only
/// the rendered form of some id. Use the codec to turn it back into an id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    /// Wraps a string without checking it against any alphabet.
    ///
    /// Codes produced by the codec are always well formed; user input should
    /// go through [`IdCodec::decode`][crate::codec::IdCodec::decode] instead.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds fully qualified short URLs out of a server and a path template.
///
/// The template contains a single `$1` placeholder for the code, e.g. `/$1`
/// or `/s/$1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortUrlTemplate {
    server: String,
    template: String,
}

impl ShortUrlTemplate {
    pub fn new(server: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            template: template.into(),
        }
    }

    /// Generates the full shortened URL for `code`.
    pub fn make_url(&self, code: &ShortCode) -> String {
        let path = self.template.replace("$1", code.as_str());
        format!("{}{}", self.server.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_inner() {
        let code = ShortCode::new_unchecked("3Ab");
        assert_eq!(code.to_string(), "3Ab");
        assert_eq!(code.as_str(), "3Ab");
    }

    #[test]
    fn make_url_with_root_template() {
        let template = ShortUrlTemplate::new("https://w.wiki/", "/$1");
        assert_eq!(
            template.make_url(&ShortCode::new_unchecked("3")),
            "https://w.wiki/3"
        );
    }

    #[test]
    fn make_url_with_nested_template() {
        let template = ShortUrlTemplate::new("http://example.org", "/s/$1");
        assert_eq!(
            template.make_url(&ShortCode::new_unchecked("_z")),
            "http://example.org/s/_z"
        );
    }
}
