//! Rate-limit detection for GitHub API failures.
//!
//! GitHub signals rate limits through:
//! - HTTP 403 with "API rate limit exceeded" in the body
//! - HTTP 429 (secondary rate limit)

/// Check whether an error message indicates a GitHub rate limit.
pub(crate) fn is_rate_limited(error: &anyhow::Error) -> bool {
    let msg = format!("{error:#}").to_lowercase();
    // A bare 403 also means "forbidden"; only the message tells them apart.
    msg.contains("rate limit") || msg.contains("status code: 429")
}

/// Operator hint attached to a rate-limited fetch failure.
pub(crate) fn hint(error: &anyhow::Error) -> &'static str {
    if format!("{error:#}").to_lowercase().contains("secondary rate limit") {
        "secondary rate limit hit; wait a moment and rerun the export"
    } else {
        "API rate limit exceeded; set GH_TOKEN or run `gh auth login` for a higher limit"
    }
}
