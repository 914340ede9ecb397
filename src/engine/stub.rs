use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};

use crate::types::{ItemId, ItemScope, ItemState, ItemSummary};

use super::interface::RemoteSource;

/// A stub remote that serves an in-memory pull request feed without any
/// network calls.
///
/// Behaves like the GitHub REST listing: filters by scope server-side,
/// sorts by `updated_at` descending, and chunks into fixed-size pages. Every
/// request is recorded so tests can assert how much of the feed a sync
/// cycle consumed.
pub struct StubRemote {
    state: Mutex<StubState>,
    per_page: usize,
}

#[derive(Default)]
struct StubState {
    feed: Vec<ItemSummary>,
    files: HashMap<ItemId, Vec<Vec<String>>>,
    failing_item_page: Option<u32>,
    failing_files: HashSet<ItemId>,
    item_requests: Vec<(ItemScope, u32)>,
    file_requests: Vec<(ItemId, u32)>,
}

/// Build a feed entry with `updated_at` at `updated_secs` past the epoch.
pub fn summary(id: ItemId, updated_secs: i64, open: bool) -> ItemSummary {
    ItemSummary {
        id,
        url: format!("https://github.com/acme/widgets/pull/{id}"),
        title: format!("PR {id}"),
        description: Some(format!("Body of {id}")),
        updated_at: at(updated_secs),
        state: if open {
            ItemState::Open
        } else {
            ItemState::Closed
        },
    }
}

/// Timestamp `secs` seconds past the epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

impl StubRemote {
    pub fn new(feed: Vec<ItemSummary>) -> Self {
        let stub = Self {
            state: Mutex::new(StubState::default()),
            per_page: 100,
        };
        for item in feed {
            stub.upsert(item);
        }
        stub
    }

    /// Serve `per_page` items per page.
    pub fn per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Serve the given pages of changed files for `id`.
    pub fn with_files(self, id: ItemId, pages: Vec<Vec<String>>) -> Self {
        self.lock().files.insert(id, pages);
        self
    }

    /// Make the listing fail at `page` (for every scope).
    pub fn failing_item_page(self, page: u32) -> Self {
        self.lock().failing_item_page = Some(page);
        self
    }

    /// Make every changed-file request for `id` fail.
    pub fn failing_files(self, id: ItemId) -> Self {
        self.lock().failing_files.insert(id);
        self
    }

    /// Add or replace a pull request in the feed, as a remote update would.
    pub fn upsert(&self, item: ItemSummary) {
        let mut state = self.lock();
        state.feed.retain(|i| i.id != item.id);
        state.feed.push(item);
        // Stable sort: equal timestamps keep insertion order.
        state.feed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }

    /// All listing requests received, in order.
    pub fn item_requests(&self) -> Vec<(ItemScope, u32)> {
        self.lock().item_requests.clone()
    }

    /// Page numbers of all listing requests, in order.
    pub fn item_pages_requested(&self) -> Vec<u32> {
        self.lock().item_requests.iter().map(|(_, p)| *p).collect()
    }

    /// Ids whose changed files were requested, in order of first request.
    pub fn files_requested(&self) -> Vec<ItemId> {
        let state = self.lock();
        state
            .file_requests
            .iter()
            .filter(|(_, page)| *page == 1)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        let mut state = self.lock();
        state.item_requests.clear();
        state.file_requests.clear();
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RemoteSource for StubRemote {
    async fn list_items(&self, scope: ItemScope, page: u32) -> Result<Vec<ItemSummary>> {
        let mut state = self.lock();
        state.item_requests.push((scope, page));
        if state.failing_item_page == Some(page) {
            bail!("stub: listing page {page} unavailable");
        }
        let skip = (page.max(1) as usize - 1) * self.per_page;
        Ok(state
            .feed
            .iter()
            .filter(|i| scope == ItemScope::All || i.state == ItemState::Open)
            .skip(skip)
            .take(self.per_page)
            .cloned()
            .collect())
    }

    async fn list_changed_files(&self, id: ItemId, page: u32) -> Result<Vec<String>> {
        let mut state = self.lock();
        state.file_requests.push((id, page));
        if state.failing_files.contains(&id) {
            bail!("stub: files of #{id} unavailable");
        }
        Ok(state
            .files
            .get(&id)
            .and_then(|pages| pages.get(page.max(1) as usize - 1))
            .cloned()
            .unwrap_or_default())
    }
}
