use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::types::SyncConfig;
use crate::store::SharedStore;
use crate::types::{ItemId, ItemRecord, ItemScope};

use super::interface::RemoteSource;
use super::pager::{ItemPages, fetch_changed_files};

/// Records gathered by one cycle, not yet committed.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    pub records: Vec<(ItemId, ItemRecord)>,
    /// Newest `updated_at` among `records`; `None` when nothing was seen.
    pub checkpoint: Option<DateTime<Utc>>,
}

/// What a completed cycle did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleReport {
    /// `items` counts the records that actually replaced stored ones.
    Committed {
        items: usize,
        checkpoint: DateTime<Utc>,
    },
    NoChanges,
    /// The store rejected the write; the next cycle re-polls the same delta.
    CommitFailed,
}

/// Periodically mirrors the remote into the shared store.
pub struct SyncEngine<R> {
    remote: R,
    store: Arc<SharedStore>,
    interval: Duration,
    overlap: TimeDelta,
}

impl<R: RemoteSource> SyncEngine<R> {
    pub fn new(remote: R, store: Arc<SharedStore>, config: &SyncConfig) -> Self {
        Self {
            remote,
            store,
            interval: Duration::from_secs(config.interval_seconds),
            overlap: i64::try_from(config.overlap_seconds)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .unwrap_or_default(),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Gather everything updated since `checkpoint`.
    ///
    /// Without a checkpoint, every open pull request is fetched. With one,
    /// the listing (sorted newest first) is consumed only until the first
    /// item not newer than the checkpoint, minus the configured overlap;
    /// nothing past that item is fetched.
    pub async fn run_cycle(&self, checkpoint: Option<DateTime<Utc>>) -> CycleOutcome {
        let (scope, stop_at) = match checkpoint {
            None => (ItemScope::Open, None),
            Some(cp) => (
                ItemScope::All,
                Some(cp.checked_sub_signed(self.overlap).unwrap_or(cp)),
            ),
        };

        let mut outcome = CycleOutcome::default();
        let mut pages = ItemPages::new(&self.remote, scope);
        'pages: while let Some(page) = pages.next_page().await {
            for item in page {
                if let Some(stop) = stop_at
                    && item.updated_at <= stop
                {
                    tracing::debug!(
                        "sync: #{} updated {} is already covered, stopping",
                        item.id,
                        item.updated_at
                    );
                    break 'pages;
                }
                tracing::debug!("sync: #{} updated {}", item.id, item.updated_at);
                outcome.checkpoint = outcome.checkpoint.max(Some(item.updated_at));
                let files = fetch_changed_files(&self.remote, item.id).await;
                outcome.records.push((item.id, item.into_record(files)));
            }
        }
        outcome
    }

    /// Run one cycle from the stored checkpoint and commit what it found.
    pub async fn sync_once(&self) -> CycleReport {
        let outcome = self.run_cycle(self.store.checkpoint()).await;
        let Some(checkpoint) = outcome.checkpoint else {
            return CycleReport::NoChanges;
        };
        let seen = outcome.records.len();
        match self.store.commit_sync(outcome.records, checkpoint) {
            Ok(0) => {
                tracing::debug!("sync: all {seen} re-scanned items already current");
                CycleReport::NoChanges
            }
            Ok(items) => CycleReport::Committed { items, checkpoint },
            Err(e) => {
                tracing::error!("sync: commit of {seen} items failed: {e}");
                CycleReport::CommitFailed
            }
        }
    }

    /// Sync forever, sleeping a full interval after each completed cycle.
    pub async fn run(self) {
        loop {
            match self.sync_once().await {
                CycleReport::Committed { items, checkpoint } => {
                    tracing::info!("sync: committed {items} items, checkpoint {checkpoint}");
                }
                CycleReport::NoChanges => tracing::info!("sync: no updates"),
                CycleReport::CommitFailed => tracing::warn!("sync: nothing committed this cycle"),
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Run the sync loop on a dedicated OS thread with its own Tokio
    /// runtime, so a stalled remote call never blocks the dashboard.
    pub fn start(self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("pr-sync".to_owned())
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt.block_on(self.run()),
                    Err(e) => tracing::error!("sync: cannot build runtime: {e}"),
                }
            })
    }
}
