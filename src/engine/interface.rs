use std::future::Future;

use anyhow::Result;

use crate::types::{ItemId, ItemScope, ItemSummary};

/// Read-only, page-at-a-time access to the remote pull request tracker.
///
/// Implemented by `GitHubRemote` for the real API and by `StubRemote` for
/// tests. Pages are 1-based; an empty page marks the end of a listing.
pub trait RemoteSource: Send + Sync + 'static {
    /// One page of pull requests, sorted by `updated_at` descending.
    fn list_items(
        &self,
        scope: ItemScope,
        page: u32,
    ) -> impl Future<Output = Result<Vec<ItemSummary>>> + Send;

    /// One page of paths changed by pull request `id`.
    fn list_changed_files(
        &self,
        id: ItemId,
        page: u32,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;
}
