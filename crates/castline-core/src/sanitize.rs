//! URL sanitizer
//!
//! Users paste share links and log lines, not bare URLs. The sanitizer pulls
//! the first `http(s)://` run out of whatever was typed.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::sync::LazyLock;
use url::Url;

static HTTP_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+").expect("HTTP_URL_RE should compile"));

/// An absolute `http`/`https` location extracted from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedUrl {
    raw: String,
    parsed: Url,
}

impl SanitizedUrl {
    /// The matched text, exactly as it appeared in the input
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed form of the location
    pub fn url(&self) -> &Url {
        &self.parsed
    }

    /// Always `http` or `https`
    pub fn scheme(&self) -> &str {
        self.parsed.scheme()
    }
}

impl std::fmt::Display for SanitizedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for SanitizedUrl {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl Serialize for SanitizedUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Extract the first absolute HTTP(S) URL from `input`.
///
/// Candidates are tried in order and the first one that parses as a URL with
/// a host wins. Returns `None` for blank input or when no `http(s)://` run
/// parses.
pub fn extract(input: &str) -> Option<SanitizedUrl> {
    if input.trim().is_empty() {
        return None;
    }

    HTTP_URL_RE.find_iter(input).find_map(|m| parse_candidate(m.as_str()))
}

fn parse_candidate(found: &str) -> Option<SanitizedUrl> {
    let parsed = Url::parse(found).ok()?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().map_or(true, str::is_empty) {
        return None;
    }

    Some(SanitizedUrl {
        raw: found.to_string(),
        parsed,
    })
}
