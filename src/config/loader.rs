use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::types::AppConfig;

const LOCAL_CONFIG_NAME: &str = ".issue-domains.toml";

/// Discover and load the app config.
///
/// Priority:
/// 1. `--config` flag (explicit path)
/// 2. `.issue-domains.toml` in the current directory or a parent, up to the
///    Git repository root
/// 3. `$ISSUE_DOMAINS_CONFIG` environment variable
/// 4. `$XDG_CONFIG_HOME/issue-domains/config.toml`
/// 5. `~/.config/issue-domains/config.toml`
///
/// The first file found is used as-is; missing keys take their defaults.
/// With no file at all the built-in defaults apply.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit_path {
        return load_file(path);
    }

    match find_repo_local_config().or_else(find_global_config) {
        Some(path) => {
            tracing::debug!("using config {}", path.display());
            load_file(&path)
        }
        None => Ok(AppConfig::default()),
    }
}

fn load_file(path: &Path) -> Result<AppConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing TOML from {}", path.display()))
}

fn find_repo_local_config() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(LOCAL_CONFIG_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir.join(".git").exists() {
            return None;
        }
        if !dir.pop() {
            return None;
        }
    }
}

fn find_global_config() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("ISSUE_DOMAINS_CONFIG") {
        let p = PathBuf::from(&path);
        if p.is_file() {
            return Some(p);
        }
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let p = PathBuf::from(xdg).join("issue-domains/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let p = PathBuf::from(home).join(".config/issue-domains/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    None
}
