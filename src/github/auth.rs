use std::fmt;
use std::process::Command;

use anyhow::{Context, Result, bail};

/// Environment variables consulted after the gh CLI, in order.
const TOKEN_ENV_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];

/// Where the API token was found; logged at startup, never the token itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    GhCli,
    Env(&'static str),
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GhCli => f.write_str("gh CLI"),
            Self::Env(var) => write!(f, "${var}"),
        }
    }
}

/// Find a token able to read pull requests on `host`.
///
/// The gh CLI's stored login wins, so the monitor follows whatever account
/// `gh auth switch` selected; `GH_TOKEN` and `GITHUB_TOKEN` cover hosts
/// without gh installed.
pub fn resolve_token(host: &str) -> Result<(String, TokenSource)> {
    match token_from_gh_cli(host) {
        Ok(token) => return Ok((token, TokenSource::GhCli)),
        Err(e) => tracing::debug!("auth: gh CLI token unavailable: {e:#}"),
    }
    if let Some(found) = token_from_env(|var| std::env::var(var).ok()) {
        return Ok(found);
    }
    bail!(
        "no GitHub token for {host}: run `gh auth login --hostname {host}` \
         or export {}",
        TOKEN_ENV_VARS.join(" or ")
    )
}

/// First non-blank token among `TOKEN_ENV_VARS`, trimmed.
fn token_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<(String, TokenSource)> {
    TOKEN_ENV_VARS.into_iter().find_map(|var| {
        let token = lookup(var)?.trim().to_owned();
        (!token.is_empty()).then_some((token, TokenSource::Env(var)))
    })
}

fn token_from_gh_cli(host: &str) -> Result<String> {
    let output = Command::new("gh")
        .args(["auth", "token", "--hostname", host])
        .output()
        .context("running `gh auth token`")?;
    if !output.status.success() {
        bail!("`gh auth token` exited with {}", output.status);
    }
    let token = String::from_utf8(output.stdout).context("gh printed a non-UTF-8 token")?;
    let token = token.trim();
    if token.is_empty() {
        bail!("gh has no token stored for {host}");
    }
    Ok(token.to_owned())
}
