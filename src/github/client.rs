use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use octocrab::Octocrab;

use crate::config::GitHubConfig;

/// Build the REST client for the configured tracker.
///
/// Connect and read timeouts are both set to `timeout_secs`; an expired
/// timeout surfaces as a request error and aborts the export.
pub fn build(config: &GitHubConfig, token: Option<String>) -> Result<Arc<Octocrab>> {
    install_crypto_provider();

    let base = config.api_base();
    let base_uri: http::Uri = base
        .parse()
        .with_context(|| format!("invalid API base URL {base:?}"))?;
    let timeout = Some(Duration::from_secs(config.timeout_secs));

    let mut builder = Octocrab::builder()
        .base_uri(base_uri)
        .context("setting API base URI")?
        .set_connect_timeout(timeout)
        .set_read_timeout(timeout);
    if let Some(token) = token {
        builder = builder.personal_token(token);
    } else {
        tracing::info!("no GitHub token found, using anonymous access");
    }

    let instance = builder.build().context("building octocrab instance")?;
    tracing::debug!("octocrab client ready for {base}");
    Ok(Arc::new(instance))
}

/// Install the rustls `CryptoProvider` before any TLS client is constructed.
/// rustls 0.23 no longer picks one automatically; a second call is a no-op.
fn install_crypto_provider() {
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        tracing::trace!("rustls crypto provider already installed");
    }
}
