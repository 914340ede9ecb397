use crate::types::{ItemId, ItemScope, ItemSummary};

use super::interface::RemoteSource;

/// Lazy, page-at-a-time walk over a pull request listing.
///
/// The pager only knows how a listing *ends* (an empty page or a failed
/// fetch). Early exit on the checkpoint is the caller's decision: it simply
/// stops calling `next_page`.
pub struct ItemPages<'a, R> {
    remote: &'a R,
    scope: ItemScope,
    next: u32,
    done: bool,
}

impl<'a, R: RemoteSource> ItemPages<'a, R> {
    pub fn new(remote: &'a R, scope: ItemScope) -> Self {
        Self {
            remote,
            scope,
            next: 1,
            done: false,
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted.
    ///
    /// A transport, status or decode failure ends the listing; it is logged
    /// and never surfaced, so whatever was consumed so far still counts.
    pub async fn next_page(&mut self) -> Option<Vec<ItemSummary>> {
        if self.done {
            return None;
        }
        match self.remote.list_items(self.scope, self.next).await {
            Ok(items) if items.is_empty() => {
                tracing::debug!(
                    "pager: {} listing ended at empty page {}",
                    self.scope.as_str(),
                    self.next
                );
                self.done = true;
                None
            }
            Ok(items) => {
                tracing::debug!(
                    "pager: {} page {} has {} items",
                    self.scope.as_str(),
                    self.next,
                    items.len()
                );
                self.next += 1;
                Some(items)
            }
            Err(e) => {
                tracing::warn!(
                    "pager: {} page {} failed, treating as end of data: {e:#}",
                    self.scope.as_str(),
                    self.next
                );
                self.done = true;
                None
            }
        }
    }

    #[cfg(test)]
    fn pages_fetched(&self) -> u32 {
        self.next - 1
    }
}

/// Collect every changed path of pull request `id` across all pages.
///
/// Returns `None` if any page fails: a partial list would look complete to
/// the dashboard filter.
pub async fn fetch_changed_files<R: RemoteSource>(remote: &R, id: ItemId) -> Option<Vec<String>> {
    let mut files = Vec::new();
    let mut page = 1;
    loop {
        match remote.list_changed_files(id, page).await {
            Ok(batch) if batch.is_empty() => return Some(files),
            Ok(batch) => {
                files.extend(batch);
                page += 1;
            }
            Err(e) => {
                tracing::warn!("pager: changed files of #{id} failed at page {page}: {e:#}");
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stub::{StubRemote, summary};

    #[tokio::test]
    async fn pages_until_empty_page() {
        let remote = StubRemote::new(vec![
            summary(1, 300, true),
            summary(2, 200, true),
            summary(3, 100, true),
        ])
        .per_page(2);
        let mut pages = ItemPages::new(&remote, ItemScope::All);
        assert_eq!(pages.next_page().await.map(|p| p.len()), Some(2));
        assert_eq!(pages.next_page().await.map(|p| p.len()), Some(1));
        assert!(pages.next_page().await.is_none());
        assert!(pages.next_page().await.is_none());
        assert_eq!(pages.pages_fetched(), 2);
        // Two pages plus the terminating empty one; nothing after exhaustion.
        assert_eq!(remote.item_pages_requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn failed_page_ends_listing() {
        let remote = StubRemote::new(vec![summary(1, 300, true), summary(2, 200, true)])
            .per_page(1)
            .failing_item_page(2);
        let mut pages = ItemPages::new(&remote, ItemScope::Open);
        assert!(pages.next_page().await.is_some());
        assert!(pages.next_page().await.is_none());
        assert!(pages.next_page().await.is_none());
        assert_eq!(remote.item_pages_requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn changed_files_span_pages() {
        let remote = StubRemote::new(vec![]).with_files(
            7,
            vec![vec!["a.rs".into(), "b.rs".into()], vec!["c.rs".into()]],
        );
        let files = fetch_changed_files(&remote, 7).await;
        assert_eq!(
            files,
            Some(vec!["a.rs".to_owned(), "b.rs".to_owned(), "c.rs".to_owned()])
        );
    }

    #[tokio::test]
    async fn changed_files_failure_is_absent() {
        let remote = StubRemote::new(vec![])
            .with_files(7, vec![vec!["a.rs".into()]])
            .failing_files(7);
        assert_eq!(fetch_changed_files(&remote, 7).await, None);
    }

    #[tokio::test]
    async fn unknown_item_has_no_files() {
        let remote = StubRemote::new(vec![]);
        assert_eq!(fetch_changed_files(&remote, 99).await, Some(vec![]));
    }
}
