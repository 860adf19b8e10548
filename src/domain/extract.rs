use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::host::{SkipSet, normalize_host};

/// Authority part of an `http(s)://` URL, stopping at path, query, fragment
/// and the punctuation that usually wraps links in Markdown or prose.
static URL_AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://([^\s/?#<>"'()\[\]{},;]+)"#).expect("URL regex is valid")
});

/// Bare dot-delimited host such as `shop.example.co.uk`.
static BARE_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:[a-z0-9-]+\.)+[a-z]{2,}\b").expect("host regex is valid")
});

/// Characters stripped from both ends of the chosen title token.
const TITLE_TOKEN_TRIM: &[char] = &[
    ' ', ',', ';', '(', ')', '[', ']', '{', '}', '<', '>', '"', '\'',
];

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Where an extracted domain was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainSource {
    Body,
    Title,
    None,
}

impl DomainSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Title => "title",
            Self::None => "none",
        }
    }
}

impl fmt::Display for DomainSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub domain: String,
    pub source: DomainSource,
}

impl Extraction {
    pub fn none() -> Self {
        Self {
            domain: String::new(),
            source: DomainSource::None,
        }
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// One tier of the extraction cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// URL or bare host on a body line that mentions "domain".
    DomainLine,
    /// First `http(s)://` URL anywhere in the body.
    BodyUrl,
    /// First bare host anywhere in the body.
    BodyBareHost,
    /// Best-looking token of the title, parsed as a URL.
    TitleToken,
}

impl Strategy {
    /// Tiers in priority order; the first one producing a host wins.
    pub const CASCADE: [Self; 4] = [
        Self::DomainLine,
        Self::BodyUrl,
        Self::BodyBareHost,
        Self::TitleToken,
    ];

    pub fn source(self) -> DomainSource {
        match self {
            Self::DomainLine | Self::BodyUrl | Self::BodyBareHost => DomainSource::Body,
            Self::TitleToken => DomainSource::Title,
        }
    }

    pub fn apply(self, skip: &SkipSet, title: &str, body: &str) -> Option<String> {
        match self {
            Self::DomainLine => body
                .lines()
                .filter(|line| line.to_lowercase().contains("domain"))
                .find_map(|line| first_reportable(skip, url_hosts(line).chain(bare_hosts(line)))),
            Self::BodyUrl => first_reportable(skip, url_hosts(body)),
            Self::BodyBareHost => first_reportable(skip, bare_hosts(body)),
            Self::TitleToken => title_host(title),
        }
    }
}

fn url_hosts(text: &str) -> impl Iterator<Item = &str> {
    URL_AUTHORITY
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn bare_hosts(text: &str) -> impl Iterator<Item = &str> {
    BARE_HOST.find_iter(text).map(|m| m.as_str())
}

fn first_reportable<'a>(
    skip: &SkipSet,
    candidates: impl Iterator<Item = &'a str>,
) -> Option<String> {
    candidates
        .filter_map(normalize_host)
        .find(|host| !skip.contains(host))
}

/// Title fallback. Unlike the body tiers this neither requires a dot nor
/// consults the skip-set; exported data already depends on that.
///
/// The token is split as text rather than parsed as a WHATWG URL, so the
/// domain is always spelled the way it appears in the title.
fn title_host(title: &str) -> Option<String> {
    let tokens: Vec<&str> = title.split_whitespace().collect();
    let token = tokens
        .iter()
        .find(|t| t.contains('.') || t.contains('/'))
        .or_else(|| tokens.first())?;

    let candidate = token.trim_matches(TITLE_TOKEN_TRIM);
    if candidate.is_empty() {
        return None;
    }

    let rest = strip_http_scheme(candidate).unwrap_or(candidate);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(end);
    let host = if authority.is_empty() {
        // No authority: fall back to the path, minus query and fragment.
        let end = tail.find(['?', '#']).unwrap_or(tail.len());
        &tail[..end]
    } else {
        authority
    };

    let host = host.split_once('@').map_or(host, |(_, h)| h);
    let host = host.split_once(':').map_or(host, |(h, _)| h);
    let host = host.trim().to_lowercase();

    (!host.is_empty()).then_some(host)
}

/// Remainder of `s` after a case-insensitive `http://` or `https://`.
fn strip_http_scheme(s: &str) -> Option<&str> {
    ["http://", "https://"].iter().find_map(|scheme| {
        s.get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .map(|_| &s[scheme.len()..])
    })
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Guesses which website an issue is about from its title and body.
#[derive(Debug, Clone, Default)]
pub struct DomainExtractor {
    skip: SkipSet,
}

impl DomainExtractor {
    pub fn new(skip: SkipSet) -> Self {
        Self { skip }
    }

    /// Run the cascade. Never fails; an issue with nothing usable yields an
    /// empty domain with source `none`.
    pub fn extract(&self, title: &str, body: Option<&str>) -> Extraction {
        let body = body.unwrap_or_default();
        for strategy in Strategy::CASCADE {
            if let Some(domain) = strategy.apply(&self.skip, title, body) {
                tracing::debug!(?strategy, %domain, "domain extracted");
                return Extraction {
                    domain,
                    source: strategy.source(),
                };
            }
        }
        Extraction::none()
    }
}
