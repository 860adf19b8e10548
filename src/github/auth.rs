use std::process::Command;

use anyhow::{Context, Result, bail};

/// Resolve a GitHub auth token for the given host, if one is available.
///
/// Priority:
/// 1. `GH_TOKEN` environment variable
/// 2. `GITHUB_TOKEN` environment variable
/// 3. `gh auth token --hostname {host}` (gh CLI)
///
/// Public repositories can be read anonymously, so a missing token is not an
/// error; it only means a lower rate limit.
pub fn resolve_token(host: &str) -> Option<String> {
    for var in ["GH_TOKEN", "GITHUB_TOKEN"] {
        if let Ok(token) = std::env::var(var)
            && !token.is_empty()
        {
            tracing::debug!("using token from {var}");
            return Some(token);
        }
    }

    match token_from_gh_cli(host) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::debug!("no token from gh CLI: {e:#}");
            None
        }
    }
}

fn token_from_gh_cli(host: &str) -> Result<String> {
    let output = Command::new("gh")
        .args(["auth", "token", "--hostname", host])
        .output()
        .context("failed to run `gh auth token`")?;

    if !output.status.success() {
        bail!("gh auth token exited with non-zero status");
    }

    let token = String::from_utf8(output.stdout)
        .context("gh auth token produced non-UTF-8 output")?
        .trim()
        .to_owned();

    if token.is_empty() {
        bail!("gh auth token returned empty string");
    }

    Ok(token)
}
