use super::common::RepoRef;

/// An issue as delivered by the tracker, reduced to what the export needs.
///
/// Nullable API fields (`title`, `user.login`, `created_at`) arrive here as
/// empty strings; only the body keeps its optionality since the extractor
/// treats "no body" and "empty body" alike anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub author: String,
    /// Timestamp exactly as the tracker rendered it.
    pub created_at: String,
    pub labels: Vec<String>,
    pub repo: RepoRef,
    /// Web URL reported by the tracker, if any.
    pub html_url: Option<String>,
    pub is_pull_request: bool,
}

impl IssueRecord {
    /// Web URL of the issue, falling back to the conventional
    /// `https://{host}/{owner}/{name}/issues/{number}` layout.
    pub fn web_url(&self, host: &str) -> String {
        match self.html_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_owned(),
            _ => format!("https://{host}/{}/issues/{}", self.repo, self.number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(html_url: Option<&str>) -> IssueRecord {
        IssueRecord {
            number: 12,
            title: String::new(),
            body: None,
            author: String::new(),
            created_at: String::new(),
            labels: vec![],
            repo: RepoRef::from_full_name("org/repo").unwrap(),
            html_url: html_url.map(str::to_owned),
            is_pull_request: false,
        }
    }

    #[test]
    fn web_url_prefers_tracker_value() {
        let issue = record(Some("https://github.com/org/repo/issues/12"));
        assert_eq!(issue.web_url("ignored"), "https://github.com/org/repo/issues/12");
    }

    #[test]
    fn web_url_falls_back_to_host_layout() {
        assert_eq!(
            record(None).web_url("git.example.com"),
            "https://git.example.com/org/repo/issues/12"
        );
    }
}
