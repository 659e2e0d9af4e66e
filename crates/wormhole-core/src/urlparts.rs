//! Lossless URL splitting.
//!
//! Stored URLs are compared byte for byte, so splitting must not re-encode
//! anything. A WHATWG parser would percent-encode characters like `"<>` in
//! the query and rewrite `\` in paths, which changes what users see.

use std::fmt::Display;
use std::str::FromStr;

/// The scheme a stored URL is expanded to when handed back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Https,
    /// `//host/path`, inherits the scheme of the page it is used from.
    Relative,
}

impl Protocol {
    fn prefix(self) -> &'static str {
        match self {
            Protocol::Http => "http://",
            Protocol::Https => "https://",
            Protocol::Relative => "//",
        }
    }

    /// The protocol of an absolute URL such as a configured server name.
    pub fn of_url(url: &str) -> Self {
        match UrlParts::parse(url).scheme {
            Some(scheme) if scheme.eq_ignore_ascii_case("https") => Protocol::Https,
            Some(_) => Protocol::Http,
            None => Protocol::Relative,
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => f.write_str("http"),
            Protocol::Https => f.write_str("https"),
            Protocol::Relative => f.write_str("relative"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            "relative" | "" => Ok(Protocol::Relative),
            other => Err(format!("unsupported protocol: {other}")),
        }
    }
}

/// Borrowed components of a URL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts<'a> {
    pub scheme: Option<&'a str>,
    pub authority: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    /// Splits `url` into components. Input without a scheme or a leading `//`
    /// is read as starting with the authority.
    pub fn parse(url: &'a str) -> Self {
        let (scheme, rest) = split_scheme(url);

        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, rest) = rest.split_at(authority_end);

        let (before_fragment, fragment) = match rest.split_once('#') {
            Some((head, fragment)) => (head, Some(fragment)),
            None => (rest, None),
        };
        let (path, query) = match before_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (before_fragment, None),
        };

        Self {
            scheme,
            authority,
            path,
            query,
            fragment,
        }
    }

    /// Reassembles the URL with the given protocol. Empty query and fragment
    /// markers are dropped.
    pub fn assemble(&self, protocol: Protocol) -> String {
        let mut url = String::with_capacity(
            protocol.prefix().len()
                + self.authority.len()
                + self.path.len()
                + self.query.map_or(0, |q| q.len() + 1)
                + self.fragment.map_or(0, |f| f.len() + 1),
        );
        url.push_str(protocol.prefix());
        url.push_str(self.authority);
        url.push_str(self.path);
        if let Some(query) = self.query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        if let Some(fragment) = self.fragment.filter(|f| !f.is_empty()) {
            url.push('#');
            url.push_str(fragment);
        }
        url
    }
}

fn split_scheme(url: &str) -> (Option<&str>, &str) {
    if let Some(rest) = url.strip_prefix("//") {
        return (None, rest);
    }
    if let Some((scheme, rest)) = url.split_once("://") {
        let mut chars = scheme.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if valid {
            return (Some(scheme), rest);
        }
    }
    (None, url)
}

/// Rewrites `url` to use `protocol`, leaving everything after the scheme untouched.
pub fn convert_to_protocol(url: &str, protocol: Protocol) -> String {
    UrlParts::parse(url).assemble(protocol)
}
