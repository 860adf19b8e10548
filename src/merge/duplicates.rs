use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use indexmap::IndexMap;

use crate::merge::engine::KEY_FIELD;
use crate::table::{Table, cell};

/// Issue numbers excluded from the duplicate-domain check.
pub type IgnoreList = HashSet<String>;

/// Placeholder listed for rows that carry a domain but no issue number.
const MISSING_KEY: &str = "?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub key: String,
    /// Total rows carrying this key.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateDomain {
    /// Repository the group belongs to; `None` when the table has no `repo` column.
    pub repo: Option<String>,
    pub domain: String,
    /// Distinct issue numbers, sorted.
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainCheck {
    /// The table has no `domain` column.
    Skipped,
    Checked {
        per_repo: bool,
        duplicates: Vec<DuplicateDomain>,
    },
}

/// Findings of a duplicate scan. Purely informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateReport {
    pub keys: Vec<DuplicateKey>,
    pub domains: DomainCheck,
}

impl DuplicateReport {
    pub fn is_clean(&self) -> bool {
        self.keys.is_empty()
            && match &self.domains {
                DomainCheck::Skipped => true,
                DomainCheck::Checked { duplicates, .. } => duplicates.is_empty(),
            }
    }
}

/// Lowercase, drop an `http(s)://` scheme and a leading `www.`.
pub fn normalize_domain(domain: &str) -> String {
    let d = domain.trim().to_lowercase();
    let d = d
        .strip_prefix("http://")
        .or_else(|| d.strip_prefix("https://"))
        .unwrap_or(&d);
    d.strip_prefix("www.").unwrap_or(d).to_owned()
}

pub fn find_duplicates(table: &Table, ignore: &IgnoreList) -> DuplicateReport {
    DuplicateReport {
        keys: duplicate_keys(table),
        domains: duplicate_domains(table, ignore),
    }
}

fn duplicate_keys(table: &Table) -> Vec<DuplicateKey> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for row in &table.rows {
        let key = cell(row, KEY_FIELD);
        if !key.is_empty() {
            *counts.entry(key).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, count)| DuplicateKey {
            key: key.to_owned(),
            count,
        })
        .collect()
}

fn duplicate_domains(table: &Table, ignore: &IgnoreList) -> DomainCheck {
    if !table.has_field("domain") {
        return DomainCheck::Skipped;
    }
    let per_repo = table.has_field("repo");

    let mut groups: BTreeMap<(Option<String>, String), BTreeSet<String>> = BTreeMap::new();
    for row in &table.rows {
        let key = cell(row, KEY_FIELD);
        if ignore.contains(key) {
            continue;
        }
        let domain = normalize_domain(cell(row, "domain"));
        if domain.is_empty() {
            continue;
        }
        let repo = per_repo.then(|| cell(row, "repo").to_owned());
        let key = if key.is_empty() { MISSING_KEY } else { key };
        groups
            .entry((repo, domain))
            .or_default()
            .insert(key.to_owned());
    }

    let duplicates = groups
        .into_iter()
        .filter(|(_, keys)| keys.len() > 1)
        .map(|((repo, domain), keys)| DuplicateDomain {
            repo,
            domain,
            keys: keys.into_iter().collect(),
        })
        .collect();

    DomainCheck::Checked {
        per_repo,
        duplicates,
    }
}

impl fmt::Display for DuplicateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keys.is_empty() {
            writeln!(f, "[OK] no duplicate {KEY_FIELD} found.")?;
        } else {
            writeln!(f, "[WARN] duplicate {KEY_FIELD} values:")?;
            for dup in &self.keys {
                writeln!(f, "  {KEY_FIELD} {} appears {} times", dup.key, dup.count)?;
            }
        }

        match &self.domains {
            DomainCheck::Skipped => {
                writeln!(f, "[INFO] no 'domain' column, duplicate-domain check skipped.")
            }
            DomainCheck::Checked {
                per_repo,
                duplicates,
            } => {
                let scope = if *per_repo { " per repo" } else { "" };
                if duplicates.is_empty() {
                    return writeln!(f, "[OK] no duplicate domains{scope} found.");
                }
                writeln!(
                    f,
                    "[INFO] duplicate domains{scope} (normalized, without www., ignore list excluded):"
                )?;
                for dup in duplicates {
                    let issues = dup.keys.join(", ");
                    match &dup.repo {
                        Some(repo) => {
                            let repo = if repo.is_empty() { "<unknown repo>" } else { repo };
                            writeln!(f, "  [{repo}] {}  -> issues: {issues}", dup.domain)?;
                        }
                        None => writeln!(f, "  {}  -> issues: {issues}", dup.domain)?,
                    }
                }
                Ok(())
            }
        }
    }
}
