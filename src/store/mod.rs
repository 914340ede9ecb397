// store module — the shared cache of synced records and visited markers

pub mod persist;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{ItemId, ItemMap, ItemRecord, NEVER_VISITED, VisitedMap};

pub use persist::StorePaths;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt store file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serializing store: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A point-in-time copy of the whole store, free to iterate without locks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub items: ItemMap,
    pub visited: VisitedMap,
    pub checkpoint: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// When `id` was last marked visited, or `NEVER_VISITED`.
    pub fn visited_at(&self, id: ItemId) -> DateTime<Utc> {
        self.visited.get(&id).copied().unwrap_or(NEVER_VISITED)
    }
}

#[derive(Default)]
struct StoreState {
    items: ItemMap,
    checkpoint: Option<DateTime<Utc>>,
    visited: VisitedMap,
}

/// Records, checkpoint and visited markers behind one coarse lock.
///
/// Only whole operations are exposed: readers see the state entirely before
/// or entirely after any commit. When backed by files, each mutation is
/// written to disk while the lock is held and only then applied in memory,
/// so a failed write leaves the store exactly as it was.
pub struct SharedStore {
    state: Mutex<StoreState>,
    paths: Option<StorePaths>,
}

impl SharedStore {
    /// A store that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            paths: None,
        }
    }

    /// Open (or start) the file-backed store in `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io {
            path: data_dir.to_owned(),
            source: e,
        })?;
        let paths = StorePaths::in_dir(data_dir);
        let (items, checkpoint) = persist::load_items(&paths.items)?;
        let visited = persist::load_visited(&paths.visited)?;
        tracing::info!(
            "store: loaded {} items, {} visited markers, checkpoint {}",
            items.len(),
            visited.len(),
            checkpoint.map_or_else(|| "unset".to_owned(), |c| c.to_rfc3339())
        );
        Ok(Self {
            state: Mutex::new(StoreState {
                items,
                checkpoint,
                visited,
            }),
            paths: Some(paths),
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            items: state.items.clone(),
            visited: state.visited.clone(),
            checkpoint: state.checkpoint,
        }
    }

    /// The newest `updated_at` committed so far, or `None` before the first
    /// committed cycle.
    pub fn checkpoint(&self) -> Option<DateTime<Utc>> {
        self.lock().checkpoint
    }

    /// Merge a cycle's records and advance the checkpoint in one step.
    ///
    /// A record replaces the stored one only when it is strictly newer, or
    /// when it carries the same `updated_at` and fills in a changed-file
    /// list the stored copy lacks. The checkpoint never moves backwards.
    /// Returns how many records were applied; when that is zero and the
    /// checkpoint stays put, nothing is written.
    pub fn commit_sync(
        &self,
        records: Vec<(ItemId, ItemRecord)>,
        checkpoint: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut state = self.lock();

        let mut items = state.items.clone();
        let mut applied = 0;
        for (id, record) in records {
            if supersedes(&record, items.get(&id)) {
                items.insert(id, record);
                applied += 1;
            } else {
                tracing::debug!("store: stored copy of #{id} is current");
            }
        }
        let checkpoint = Some(state.checkpoint.map_or(checkpoint, |c| c.max(checkpoint)));
        if applied == 0 && checkpoint == state.checkpoint {
            return Ok(0);
        }

        if let Some(paths) = &self.paths {
            persist::save_items(&paths.items, &items, checkpoint)?;
        }
        state.items = items;
        state.checkpoint = checkpoint;
        Ok(applied)
    }

    /// Record that `id` was visited at `at`. `NEVER_VISITED` resets it.
    ///
    /// The latest call wins regardless of the timestamps involved.
    pub fn set_visited(&self, id: ItemId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.lock();
        if let Some(paths) = &self.paths {
            let mut visited = state.visited.clone();
            visited.insert(id, at);
            persist::save_visited(&paths.visited, &visited)?;
            state.visited = visited;
        } else {
            state.visited.insert(id, at);
        }
        Ok(())
    }

    // A panic while holding the lock cannot leave a half-applied mutation:
    // every mutation swaps in fully built maps.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn supersedes(record: &ItemRecord, stored: Option<&ItemRecord>) -> bool {
    match stored {
        None => true,
        Some(stored) if record.updated_at > stored.updated_at => true,
        Some(stored) => {
            record.updated_at == stored.updated_at
                && stored.changed_files.is_none()
                && record.changed_files.is_some()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stub::{at, summary};
    use std::sync::Arc;

    fn record(id: ItemId, updated: i64) -> (ItemId, ItemRecord) {
        (id, summary(id, updated, true).into_record(Some(vec![])))
    }

    #[test]
    fn empty_commit_changes_nothing() {
        let store = SharedStore::in_memory();
        store.commit_sync(vec![], at(500)).unwrap();
        assert_eq!(store.checkpoint(), None);
        assert!(store.snapshot().items.is_empty());
    }

    #[test]
    fn checkpoint_never_regresses() {
        let store = SharedStore::in_memory();
        store.commit_sync(vec![record(1, 300)], at(300)).unwrap();
        store.commit_sync(vec![record(2, 100)], at(100)).unwrap();
        assert_eq!(store.checkpoint(), Some(at(300)));
        assert_eq!(store.snapshot().items.len(), 2);
    }

    #[test]
    fn stored_newer_record_is_kept() {
        let store = SharedStore::in_memory();
        store.commit_sync(vec![record(1, 300)], at(300)).unwrap();
        assert_eq!(store.commit_sync(vec![record(1, 200)], at(200)).unwrap(), 0);
        assert_eq!(store.snapshot().items[&1].updated_at, at(300));

        assert_eq!(store.commit_sync(vec![record(1, 400)], at(400)).unwrap(), 1);
        assert_eq!(store.snapshot().items[&1].updated_at, at(400));
    }

    #[test]
    fn same_timestamp_only_fills_missing_files() {
        let store = SharedStore::in_memory();
        let files = |f: Option<Vec<String>>| (1, summary(1, 100, true).into_record(f));
        store
            .commit_sync(vec![files(Some(vec!["src/a.rs".into()]))], at(100))
            .unwrap();

        assert_eq!(store.commit_sync(vec![files(None)], at(100)).unwrap(), 0);
        assert_eq!(store.commit_sync(vec![files(Some(vec![]))], at(100)).unwrap(), 0);
        assert_eq!(
            store.snapshot().items[&1].changed_files,
            Some(vec!["src/a.rs".to_owned()])
        );

        let store = SharedStore::in_memory();
        store.commit_sync(vec![files(None)], at(100)).unwrap();
        assert_eq!(
            store
                .commit_sync(vec![files(Some(vec!["src/b.rs".into()]))], at(100))
                .unwrap(),
            1
        );
        assert_eq!(
            store.snapshot().items[&1].changed_files,
            Some(vec!["src/b.rs".to_owned()])
        );
    }

    #[test]
    fn unchanged_commit_skips_the_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = SharedStore::open(dir.path()).unwrap();
        store.commit_sync(vec![record(1, 10)], at(10)).unwrap();

        // A failing write would surface as an error if one were attempted.
        std::fs::remove_dir_all(dir.path()).unwrap();
        std::fs::write(dir.path(), b"").unwrap();

        assert_eq!(store.commit_sync(vec![record(1, 10)], at(10)).unwrap(), 0);
    }

    #[test]
    fn reset_wins_by_recency_not_value() {
        let store = SharedStore::in_memory();
        store.set_visited(1, at(150)).unwrap();
        store.set_visited(1, NEVER_VISITED).unwrap();
        assert_eq!(store.snapshot().visited_at(1), NEVER_VISITED);
    }

    #[test]
    fn visited_for_unsynced_id() {
        let store = SharedStore::in_memory();
        store.set_visited(42, at(10)).unwrap();
        let snapshot = store.snapshot();
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.visited_at(42), at(10));
        assert_eq!(snapshot.visited_at(43), NEVER_VISITED);
    }

    #[test]
    fn concurrent_visits_are_not_lost() {
        let store = Arc::new(SharedStore::in_memory());
        let handles: Vec<_> = (1..=64)
            .map(|id| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.set_visited(id, at(1000 + id as i64)).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = store.snapshot();
        assert_eq!(snapshot.visited.len(), 64);
        for id in 1..=64 {
            assert_eq!(snapshot.visited_at(id), at(1000 + id as i64));
        }
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SharedStore::open(dir.path()).unwrap();
            store.commit_sync(vec![record(5, 50)], at(50)).unwrap();
            store.set_visited(5, at(50)).unwrap();
        }
        let store = SharedStore::open(dir.path()).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.checkpoint, Some(at(50)));
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.visited_at(5), at(50));
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = SharedStore::open(dir.path()).unwrap();
        store.commit_sync(vec![record(1, 10)], at(10)).unwrap();

        // Replace the data directory with a file so the next write fails.
        std::fs::remove_dir_all(dir.path()).unwrap();
        std::fs::write(dir.path(), b"").unwrap();

        assert!(store.commit_sync(vec![record(2, 20)], at(20)).is_err());
        assert!(store.set_visited(1, at(10)).is_err());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.checkpoint, Some(at(10)));
        assert_eq!(snapshot.items.len(), 1);
        assert!(snapshot.visited.is_empty());
    }
}
