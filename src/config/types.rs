use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use url::Url;

use crate::types::{RepoParseError, RepoRef};

pub const DEFAULT_REPO_OWNER: &str = "svemailproject";
pub const DEFAULT_REPO_NAME: &str = "TheySoldMyEmail";
pub const DEFAULT_EXPORT_PATH: &str = "issues-latest.csv";
pub const DEFAULT_DB_PATH: &str = "issues-db.csv";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub github: GitHubConfig,
    /// Repositories to export, in export order.
    pub repos: Vec<RepoSpec>,
    pub export: ExportConfig,
    pub merge: MergeConfig,
    pub extract: ExtractConfig,
}

impl AppConfig {
    /// Hosts never reported from an issue body: the tracker's own web and API
    /// hosts, then the configured extras.
    pub fn skip_hosts(&self) -> Vec<String> {
        let mut hosts = self.github.tracker_hosts();
        for extra in &self.extract.skip_hosts {
            let extra = extra.trim().to_lowercase();
            if !extra.is_empty() && !hosts.contains(&extra) {
                hosts.push(extra);
            }
        }
        hosts
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            repos: vec![RepoSpec {
                repo: RepoRef {
                    owner: DEFAULT_REPO_OWNER.to_owned(),
                    name: DEFAULT_REPO_NAME.to_owned(),
                },
                offset: 0,
            }],
            export: ExportConfig::default(),
            merge: MergeConfig::default(),
            extract: ExtractConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Web host of the tracker (`github.com` or a GitHub Enterprise host).
    pub host: String,
    /// REST base URL override; derived from `host` when unset.
    pub api_url: Option<String>,
    pub per_page: u8,
    /// Per-request timeout. Expiry aborts the export.
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            host: "github.com".to_owned(),
            api_url: None,
            per_page: 100,
            timeout_secs: 30,
        }
    }
}

impl GitHubConfig {
    /// REST API base URL for the configured host.
    pub fn api_base(&self) -> String {
        if let Some(url) = self.api_url.as_deref().filter(|u| !u.is_empty()) {
            return url.trim_end_matches('/').to_owned();
        }
        if self.host == "github.com" {
            "https://api.github.com".to_owned()
        } else {
            format!("https://{}/api/v3", self.host)
        }
    }

    /// Web host and REST API host of the tracker, lowercased and deduplicated.
    pub fn tracker_hosts(&self) -> Vec<String> {
        let mut hosts = Vec::with_capacity(2);
        let web = self.host.trim().to_lowercase();
        if !web.is_empty() {
            hosts.push(web);
        }
        match Url::parse(&self.api_base()) {
            Ok(api) => {
                if let Some(api_host) = api.host_str()
                    && !hosts.iter().any(|h| h == api_host)
                {
                    hosts.push(api_host.to_owned());
                }
            }
            Err(e) => tracing::warn!("cannot derive API host from {:?}: {e}", self.api_base()),
        }
        hosts
    }
}

/// A repository to export and the offset added to its issue numbers.
///
/// Offsets must be chosen so that `offset + number` never collides across
/// repositories; this is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoSpec {
    pub repo: RepoRef,
    #[serde(default)]
    pub offset: u64,
}

impl FromStr for RepoSpec {
    type Err = RepoParseError;

    /// Parse `owner/name` or `owner/name=offset`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || RepoParseError {
            value: s.to_owned(),
        };
        let (repo, offset) = match s.split_once('=') {
            Some((repo, offset)) => (repo, offset.trim().parse().map_err(|_| err())?),
            None => (s, 0),
        };
        Ok(Self {
            repo: repo.parse().map_err(|_| err())?,
            offset,
        })
    }
}

// ---------------------------------------------------------------------------
// Export / merge / extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default output file; rotated before each export.
    pub output: PathBuf,
    /// Render domains as `www.<domain>` for spreadsheet link detection.
    pub clickable_domains: bool,
    /// Append a `root_domain` column.
    pub root_domain_column: bool,
    /// Append a `labels` column (comma-joined label names).
    pub labels_column: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_EXPORT_PATH),
            clickable_domains: false,
            root_domain_column: false,
            labels_column: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub source: PathBuf,
    pub db: PathBuf,
    /// Issue numbers left out of the duplicate-domain check (e.g. overview issues).
    pub ignore_domain_duplicates: Vec<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_EXPORT_PATH),
            db: PathBuf::from(DEFAULT_DB_PATH),
            ignore_domain_duplicates: vec!["98".to_owned()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Extra hosts never reported from an issue body, on top of the
    /// tracker's own hosts.
    pub skip_hosts: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            skip_hosts: vec!["github.com".to_owned(), "api.github.com".to_owned()],
        }
    }
}
