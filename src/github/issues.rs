use std::sync::Arc;

use anyhow::{Context, Result};
use octocrab::{Octocrab, Page};
use serde::{Deserialize, Serialize};

use crate::github::rate_limit;
use crate::types::{IssueRecord, RepoRef};

// ---------------------------------------------------------------------------
// Source abstraction
// ---------------------------------------------------------------------------

/// One page of the tracker's open-issue listing.
#[derive(Debug, Clone, Default)]
pub struct IssuePage {
    /// Every item on the page, pull requests included.
    pub items: Vec<IssueRecord>,
    /// Whether the tracker announced a `next` page.
    pub has_next: bool,
}

/// Anything that can list open issues page by page (GitHub, or a stub).
#[allow(async_fn_in_trait)]
pub trait IssueSource {
    /// Fetch page `page` (1-based) of open issues for `repo`.
    async fn fetch_page(&self, repo: &RepoRef, page: u32) -> Result<IssuePage>;
}

/// Lazily walks the pages of one repository, yielding only real issues.
///
/// A fresh pager always starts again at page 1.
pub struct IssuePager<'a, S> {
    source: &'a S,
    repo: &'a RepoRef,
    next_page: u32,
    done: bool,
}

impl<'a, S: IssueSource> IssuePager<'a, S> {
    pub fn new(source: &'a S, repo: &'a RepoRef) -> Self {
        Self {
            source,
            repo,
            next_page: 1,
            done: false,
        }
    }

    /// Next batch of issues (pull requests removed), or `None` once the
    /// listing is exhausted. A batch may be empty when a page held only PRs.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<IssueRecord>>> {
        if self.done {
            return Ok(None);
        }

        let page = self.next_page;
        let fetched = self.source.fetch_page(self.repo, page).await?;
        tracing::debug!(
            "{}: page {page} has {} items (next: {})",
            self.repo,
            fetched.items.len(),
            fetched.has_next
        );

        if fetched.items.is_empty() {
            self.done = true;
            return Ok(None);
        }
        if fetched.has_next {
            self.next_page += 1;
        } else {
            self.done = true;
        }

        Ok(Some(
            fetched
                .items
                .into_iter()
                .filter(|issue| !issue.is_pull_request)
                .collect(),
        ))
    }
}

// ---------------------------------------------------------------------------
// GitHub REST implementation
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ListParams {
    state: &'static str,
    per_page: u8,
    page: u32,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: Option<String>,
}

/// Issue item as returned by `GET /repos/{owner}/{repo}/issues`.
///
/// Deliberately lenient: every field except `number` may be null or absent.
#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    title: Option<String>,
    body: Option<String>,
    user: Option<RawUser>,
    created_at: Option<String>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    html_url: Option<String>,
    pull_request: Option<serde_json::Value>,
}

impl RawIssue {
    fn into_record(self, repo: &RepoRef) -> IssueRecord {
        IssueRecord {
            number: self.number,
            title: self.title.unwrap_or_default().trim().to_owned(),
            body: self.body,
            author: self.user.and_then(|u| u.login).unwrap_or_default(),
            created_at: self.created_at.unwrap_or_default(),
            labels: self.labels.into_iter().filter_map(|l| l.name).collect(),
            repo: repo.clone(),
            html_url: self.html_url,
            is_pull_request: self.pull_request.is_some(),
        }
    }
}

/// Lists open issues through the GitHub REST API.
pub struct GitHubIssues {
    octocrab: Arc<Octocrab>,
    per_page: u8,
}

impl GitHubIssues {
    pub fn new(octocrab: Arc<Octocrab>, per_page: u8) -> Self {
        Self {
            octocrab,
            per_page: per_page.clamp(1, 100),
        }
    }
}

impl IssueSource for GitHubIssues {
    async fn fetch_page(&self, repo: &RepoRef, page: u32) -> Result<IssuePage> {
        let route = format!("/repos/{}/{}/issues", repo.owner, repo.name);
        let params = ListParams {
            state: "open",
            per_page: self.per_page,
            page,
        };

        let result: Result<Page<RawIssue>> = self
            .octocrab
            .get(route, Some(&params))
            .await
            .with_context(|| format!("fetching open issues of {repo} (page {page})"));
        let listing = match result {
            Ok(listing) => listing,
            Err(e) if rate_limit::is_rate_limited(&e) => {
                let hint = rate_limit::hint(&e);
                return Err(e.context(hint));
            }
            Err(e) => return Err(e),
        };

        Ok(IssuePage {
            has_next: listing.next.is_some(),
            items: listing
                .items
                .into_iter()
                .map(|raw| raw.into_record(repo))
                .collect(),
        })
    }
}
