use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::Deserialize;

use crate::config::types::GitHubConfig;
use crate::engine::RemoteSource;
use crate::github::client;
use crate::types::{ItemId, ItemScope, ItemState, ItemSummary};

// ---------------------------------------------------------------------------
// Raw REST shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawPull {
    number: u64,
    html_url: String,
    title: String,
    #[serde(default)]
    body: Option<String>,
    updated_at: DateTime<Utc>,
    state: ItemState,
}

#[derive(Deserialize)]
struct RawFile {
    filename: String,
}

impl From<RawPull> for ItemSummary {
    fn from(p: RawPull) -> Self {
        Self {
            id: p.number,
            url: p.html_url,
            title: p.title,
            description: p.body,
            updated_at: p.updated_at,
            state: p.state,
        }
    }
}

// ---------------------------------------------------------------------------
// Remote
// ---------------------------------------------------------------------------

/// Pull requests of one repository, read through the GitHub REST API.
pub struct GitHubRemote {
    octocrab: Arc<Octocrab>,
    owner: String,
    repo: String,
    per_page: u8,
}

impl GitHubRemote {
    pub fn new(octocrab: Arc<Octocrab>, config: &GitHubConfig) -> Self {
        Self {
            octocrab,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            per_page: config.per_page.clamp(1, 100),
        }
    }

    /// Authenticate against the configured host and build the remote.
    pub fn connect(config: &GitHubConfig) -> Result<Self> {
        let octocrab = client::octocrab_for(&config.host)?;
        Ok(Self::new(Arc::new(octocrab), config))
    }

    fn page_params(&self, page: u32) -> HashMap<&'static str, String> {
        let mut params = HashMap::new();
        params.insert("per_page", self.per_page.to_string());
        params.insert("page", page.to_string());
        params
    }
}

impl RemoteSource for GitHubRemote {
    async fn list_items(&self, scope: ItemScope, page: u32) -> Result<Vec<ItemSummary>> {
        let mut params = self.page_params(page);
        params.insert("state", scope.as_str().to_owned());
        params.insert("sort", "updated".to_owned());
        params.insert("direction", "desc".to_owned());

        let route = format!("/repos/{}/{}/pulls", self.owner, self.repo);
        let pulls: Vec<RawPull> = self
            .octocrab
            .get(route, Some(&params))
            .await
            .with_context(|| format!("listing {} pull requests, page {page}", scope.as_str()))?;

        Ok(pulls.into_iter().map(ItemSummary::from).collect())
    }

    async fn list_changed_files(&self, id: ItemId, page: u32) -> Result<Vec<String>> {
        let params = self.page_params(page);
        let route = format!("/repos/{}/{}/pulls/{id}/files", self.owner, self.repo);
        let files: Vec<RawFile> = self
            .octocrab
            .get(route, Some(&params))
            .await
            .with_context(|| format!("listing files of #{id}, page {page}"))?;

        Ok(files.into_iter().map(|f| f.filename).collect())
    }
}
