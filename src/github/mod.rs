pub mod auth;
pub mod client;
pub mod issues;
mod rate_limit;

pub use issues::{GitHubIssues, IssuePage, IssuePager, IssueSource};
