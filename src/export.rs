//! Open issues → delimited export table.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::config::{ExportConfig, RepoSpec};
use crate::domain::{DomainExtractor, DomainSource, clickable_domain, root_domain};
use crate::github::{IssuePager, IssueSource};
use crate::table::TableWriter;
use crate::types::IssueRecord;

/// Standard export columns, in order.
pub const EXPORT_FIELDS: [&str; 9] = [
    "issue_number",
    "issue_url",
    "title",
    "domain",
    "domain_source",
    "author",
    "created_at",
    "repo",
    "gh_issue_number",
];

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Shape of the export table beyond the standard columns.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Web host used when the tracker omits an issue's URL.
    pub web_host: String,
    pub clickable_domains: bool,
    pub root_domain_column: bool,
    pub labels_column: bool,
}

impl ExportOptions {
    pub fn from_config(config: &ExportConfig, web_host: &str) -> Self {
        Self {
            web_host: web_host.to_owned(),
            clickable_domains: config.clickable_domains,
            root_domain_column: config.root_domain_column,
            labels_column: config.labels_column,
        }
    }

    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = EXPORT_FIELDS.to_vec();
        if self.root_domain_column {
            fields.push("root_domain");
        }
        if self.labels_column {
            fields.push("labels");
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    /// `offset + gh_issue_number`; the merge key.
    pub issue_number: u64,
    pub issue_url: String,
    pub title: String,
    pub domain: String,
    pub domain_source: DomainSource,
    pub author: String,
    pub created_at: String,
    pub repo: String,
    pub gh_issue_number: u64,
    pub labels: Vec<String>,
}

impl ExportRow {
    /// Cell values matching `options.fields()`.
    pub fn values(&self, options: &ExportOptions) -> Vec<String> {
        let domain = if options.clickable_domains {
            clickable_domain(&self.domain)
        } else {
            self.domain.clone()
        };
        let mut values = vec![
            self.issue_number.to_string(),
            self.issue_url.clone(),
            self.title.clone(),
            domain,
            self.domain_source.to_string(),
            self.author.clone(),
            self.created_at.clone(),
            self.repo.clone(),
            self.gh_issue_number.to_string(),
        ];
        if options.root_domain_column {
            values.push(if self.domain.is_empty() {
                String::new()
            } else {
                root_domain(&self.domain)
            });
        }
        if options.labels_column {
            values.push(self.labels.join(","));
        }
        values
    }
}

// ---------------------------------------------------------------------------
// Destination & rotation
// ---------------------------------------------------------------------------

/// Where an export is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The configured default file; an existing one is rotated away first.
    Default(PathBuf),
    /// An explicit file, overwritten in place.
    File(PathBuf),
    Stdout,
}

/// Archive name for a rotated export: `issues-latest.csv` becomes
/// `issues-YYYYMMDD_HHMMSS.csv` next to it; other names get the timestamp
/// appended to their stem.
pub fn archive_path(path: &Path, timestamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("issues");
    let stem = stem.strip_suffix("-latest").unwrap_or(stem);
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}-{timestamp}.{ext}"),
        None => format!("{stem}-{timestamp}"),
    };
    path.with_file_name(name)
}

/// Rename an existing file at `path` to its timestamped archive name.
pub fn rotate_if_exists(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let archived = archive_path(path, &timestamp);
    std::fs::rename(path, &archived).with_context(|| {
        format!(
            "archiving {} as {}",
            path.display(),
            archived.display()
        )
    })?;
    Ok(Some(archived))
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Issues written per repository, in export order.
    pub per_repo: Vec<(String, usize)>,
    pub total: usize,
    /// Where the previous default export was moved, if anywhere.
    pub archived: Option<PathBuf>,
}

/// Fetches every configured repository and writes one row per issue.
pub struct Exporter<S> {
    source: S,
    repos: Vec<RepoSpec>,
    extractor: DomainExtractor,
    options: ExportOptions,
}

impl<S: IssueSource> Exporter<S> {
    pub fn new(
        source: S,
        repos: Vec<RepoSpec>,
        extractor: DomainExtractor,
        options: ExportOptions,
    ) -> Self {
        Self {
            source,
            repos,
            extractor,
            options,
        }
    }

    /// Build the export row for one issue. Fails when `offset + number`
    /// does not fit the issue number column.
    pub fn row_for(&self, spec: &RepoSpec, issue: &IssueRecord) -> Result<ExportRow> {
        let issue_number = spec.offset.checked_add(issue.number).with_context(|| {
            format!(
                "{}: offset {} + issue #{} overflows the issue number",
                spec.repo, spec.offset, issue.number
            )
        })?;
        let extraction = self.extractor.extract(&issue.title, issue.body.as_deref());
        Ok(ExportRow {
            issue_number,
            issue_url: issue.web_url(&self.options.web_host),
            title: issue.title.clone(),
            domain: extraction.domain,
            domain_source: extraction.source,
            author: issue.author.clone(),
            created_at: issue.created_at.clone(),
            repo: issue.repo.full_name(),
            gh_issue_number: issue.number,
            labels: issue.labels.clone(),
        })
    }

    /// Stream the export into `out`. Any fetch failure aborts with an error;
    /// rows already written stay written.
    pub async fn write_to<W: Write>(&self, out: W, bom: bool) -> Result<ExportSummary> {
        let mut writer = TableWriter::new(out, &self.options.fields(), bom)?;
        let mut summary = ExportSummary::default();

        for spec in &self.repos {
            let mut count = 0;
            let mut pager = IssuePager::new(&self.source, &spec.repo);
            while let Some(batch) = pager.next_batch().await? {
                for issue in &batch {
                    let row = self.row_for(spec, issue)?;
                    writer.write_values(&row.values(&self.options))?;
                    count += 1;
                }
            }
            tracing::info!("{}: {count} open issues", spec.repo);
            summary.per_repo.push((spec.repo.full_name(), count));
            summary.total += count;
        }

        writer.finish()?;
        tracing::info!("{} issues exported in total", summary.total);
        Ok(summary)
    }

    /// Run the export to `destination`, rotating the default file first.
    pub async fn run(&self, destination: &Destination) -> Result<ExportSummary> {
        match destination {
            Destination::Stdout => {
                let stdout = std::io::stdout();
                self.write_to(stdout.lock(), false).await
            }
            Destination::File(path) => self.write_file(path).await,
            Destination::Default(path) => {
                let archived = rotate_if_exists(path)?;
                if let Some(ref archived) = archived {
                    tracing::info!("previous export archived as {}", archived.display());
                }
                let mut summary = self.write_file(path).await?;
                summary.archived = archived;
                Ok(summary)
            }
        }
    }

    async fn write_file(&self, path: &Path) -> Result<ExportSummary> {
        let file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let summary = self
            .write_to(file, true)
            .await
            .with_context(|| format!("exporting to {}", path.display()))?;
        tracing::info!("table written: {}", path.display());
        Ok(summary)
    }
}
