use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use issue_domains::config::{AppConfig, RepoSpec, loader};
use issue_domains::domain::{DomainExtractor, SkipSet};
use issue_domains::export::{Destination, ExportOptions, Exporter};
use issue_domains::github::{self, GitHubIssues};
use issue_domains::merge::{self, IgnoreList, MergeOutcome};

#[derive(Parser)]
#[command(
    name = "issue-domains",
    version,
    about = "Export open GitHub issues with the domain they report, and merge exports"
)]
struct Cli {
    /// Path to config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export open issues to a semicolon-delimited table.
    Export(ExportArgs),
    /// Merge an export into the persistent table and report duplicates.
    Merge(MergeArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Write to this file instead of the default (no rotation).
    #[arg(short, long, conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Write the table to stdout (no files, no rotation).
    #[arg(long)]
    stdout: bool,

    /// Repository to export as `owner/name[=offset]`; repeatable. Replaces
    /// the configured repository list.
    #[arg(long = "repo", value_name = "REPO")]
    repos: Vec<RepoSpec>,
}

#[derive(Args)]
struct MergeArgs {
    /// Export table to merge from [default: issues-latest.csv].
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Persistent table to merge into [default: issues-db.csv].
    #[arg(short, long)]
    db: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `export --stdout` stays a clean table.
    let default_filter = if cli.debug {
        "issue_domains=debug,warn"
    } else {
        "issue_domains=info,warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let config = loader::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Export(args) => run_export(config, args),
        Commands::Merge(args) => run_merge(&config, args),
    }
}

fn run_export(config: AppConfig, args: ExportArgs) -> Result<()> {
    let repos = if args.repos.is_empty() {
        config.repos.clone()
    } else {
        args.repos
    };
    let destination = if args.stdout {
        Destination::Stdout
    } else if let Some(path) = args.output {
        Destination::File(path)
    } else {
        Destination::Default(config.export.output.clone())
    };

    // Single-threaded: one request in flight, repositories in order.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    runtime.block_on(async {
        let token = github::auth::resolve_token(&config.github.host);
        let octocrab = github::client::build(&config.github, token)?;
        let exporter = Exporter::new(
            GitHubIssues::new(octocrab, config.github.per_page),
            repos,
            DomainExtractor::new(SkipSet::new(config.skip_hosts())),
            ExportOptions::from_config(&config.export, &config.github.host),
        );
        exporter.run(&destination).await?;
        Ok::<_, anyhow::Error>(())
    })
}

fn run_merge(config: &AppConfig, args: MergeArgs) -> Result<()> {
    let source = args.source.unwrap_or_else(|| config.merge.source.clone());
    let db = args.db.unwrap_or_else(|| config.merge.db.clone());
    let ignore: IgnoreList = config
        .merge
        .ignore_domain_duplicates
        .iter()
        .map(|k| k.trim().to_owned())
        .collect();

    let summary = merge::merge_files(&db, &source, &ignore)?;
    match summary.outcome {
        MergeOutcome::Created => {
            println!("new db created from {}: {}", source.display(), db.display());
        }
        MergeOutcome::Updated => {
            println!("db updated: {}", db.display());
            println!(
                "source: {}, total entries: {}",
                source.display(),
                summary.total_rows
            );
        }
    }
    print!("{}", summary.report);
    Ok(())
}
