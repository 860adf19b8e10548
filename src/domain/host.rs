use std::collections::HashSet;

/// Second-level labels that behave like a public suffix, e.g. `example.co.uk`.
const MULTI_PART_TLDS: &[&str] = &[
    "co.uk", "org.uk", "gov.uk", "ac.uk", "com.au", "net.au", "org.au", "co.nz", "com.br",
    "com.ar", "com.mx", "co.jp",
];

/// Normalize a raw URL authority or bare host candidate.
///
/// Lowercases, drops userinfo (`user:pass@`) and a trailing `:port`, and trims
/// sentence punctuation that the surrounding text glued onto the host.
/// Returns `None` when the result does not contain a dot.
pub fn normalize_host(raw: &str) -> Option<String> {
    let host = raw.trim().to_lowercase();
    let host = host.split_once('@').map_or(host.as_str(), |(_, h)| h);
    let host = host.split_once(':').map_or(host, |(h, _)| h);
    let host = host.trim_end_matches('.');

    if host.is_empty() || !host.contains('.') {
        return None;
    }
    Some(host.to_owned())
}

/// Reduce a normalized host to its registrable ("root") domain.
///
/// `www.` is dropped first; known multi-part suffixes keep three labels,
/// everything else keeps the last two.
pub fn root_domain(host: &str) -> String {
    let without_www = host.strip_prefix("www.").unwrap_or(host);
    let parts: Vec<&str> = without_www.split('.').collect();
    if parts.len() <= 2 {
        return without_www.to_owned();
    }

    let last_two = parts[parts.len() - 2..].join(".");
    if MULTI_PART_TLDS.contains(&last_two.as_str()) {
        parts[parts.len() - 3..].join(".")
    } else {
        last_two
    }
}

/// Render a domain as `www.<domain>` so spreadsheet viewers turn it into a link.
pub fn clickable_domain(domain: &str) -> String {
    if domain.is_empty() {
        return String::new();
    }
    let bare = domain.strip_prefix("www.").unwrap_or(domain);
    format!("www.{bare}")
}

/// Hosts owned by the issue tracker itself; never reported as the implicated
/// domain when found in an issue body.
#[derive(Debug, Clone, Default)]
pub struct SkipSet {
    hosts: HashSet<String>,
}

impl SkipSet {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_lowercase())
    }
}
