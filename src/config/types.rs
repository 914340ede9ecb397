use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub github: GitHubConfig,
    pub sync: SyncConfig,
    pub server: ServerConfig,
    pub filters: FilterConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Reject configurations the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.github.owner.is_empty() || self.github.repo.is_empty() {
            bail!("[github] owner and repo must both be set");
        }
        if self.sync.interval_seconds < MIN_INTERVAL_SECONDS {
            bail!(
                "[sync] interval_seconds must be at least {MIN_INTERVAL_SECONDS}, got {}",
                self.sync.interval_seconds
            );
        }
        if self.sync.overlap_seconds > MAX_OVERLAP_SECONDS {
            bail!(
                "[sync] overlap_seconds must be at most {MAX_OVERLAP_SECONDS}, got {}",
                self.sync.overlap_seconds
            );
        }
        if self.server.refresh_seconds < MIN_REFRESH_SECONDS {
            bail!(
                "[server] refresh_seconds must be at least {MIN_REFRESH_SECONDS}, got {}",
                self.server.refresh_seconds
            );
        }
        self.server.listen_addr()?;
        Ok(())
    }
}

pub const MIN_INTERVAL_SECONDS: u64 = 10;
pub const MAX_OVERLAP_SECONDS: u64 = 86_400;
pub const MIN_REFRESH_SECONDS: u32 = 5;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub host: String,
    pub owner: String,
    pub repo: String,
    /// Page size for REST listings (GitHub caps it at 100).
    pub per_page: u8,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            host: "github.com".to_owned(),
            owner: String::new(),
            repo: String::new(),
            per_page: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Pause between the end of one cycle and the start of the next.
    pub interval_seconds: u64,
    /// Re-scan this far behind the checkpoint to tolerate items updated in
    /// the same instant. `0` trusts the remote ordering exactly.
    pub overlap_seconds: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 600,
            overlap_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Browser auto-refresh period of the dashboard page.
    pub refresh_seconds: u32,
}

impl ServerConfig {
    /// The socket to listen on. `bind` is a bare IPv4 or IPv6 address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("[server] invalid bind address {:?}", self.bind))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_owned(),
            port: 3030,
            refresh_seconds: 30,
        }
    }
}

/// Path-prefix filters applied to each pull request's changed files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Show an item only if one of its files starts with one of these.
    /// Empty means every item passes.
    pub include: Vec<String>,
    /// Hide an item if any of its files starts with one of these.
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `items.json` and `visited.json`.
    /// Defaults to `~/.local/share/pr-monitor`.
    pub data_dir: Option<String>,
}
