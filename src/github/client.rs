use anyhow::{Context, Result};
use octocrab::Octocrab;

use crate::github::auth;

/// REST API root for `host`: api.github.com for github.com, the `/api/v3`
/// prefix for GitHub Enterprise Server.
pub fn api_base_uri(host: &str) -> String {
    if host == "github.com" {
        "https://api.github.com".to_owned()
    } else {
        format!("https://{host}/api/v3")
    }
}

/// Build an authenticated Octocrab instance for `host`.
pub fn octocrab_for(host: &str) -> Result<Octocrab> {
    let (token, source) = auth::resolve_token(host)?;
    tracing::info!("auth: using token from {source} for {host}");
    build_octocrab(&api_base_uri(host), token)
}

/// Build an Octocrab instance against an explicit API root.
pub fn build_octocrab(base_uri: &str, token: String) -> Result<Octocrab> {
    Octocrab::builder()
        .personal_token(token)
        .base_uri(base_uri)
        .with_context(|| format!("setting base URI {base_uri}"))?
        .build()
        .context("building octocrab instance")
}
