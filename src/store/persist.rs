//! On-disk form of the store.
//!
//! Two JSON documents, each replaced atomically (temp file, fsync, rename):
//! - `items.json` holds the records *and* the checkpoint, so a checkpoint
//!   can never become durable without the records that justify it.
//! - `visited.json` holds the visited markers.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ItemMap, VisitedMap};

use super::StoreError;

pub const ITEMS_FILE: &str = "items.json";
pub const VISITED_FILE: &str = "visited.json";

#[derive(Default, Deserialize)]
struct ItemsFile {
    #[serde(default)]
    checkpoint: Option<DateTime<Utc>>,
    #[serde(default)]
    items: ItemMap,
}

#[derive(Serialize)]
struct ItemsFileRef<'a> {
    checkpoint: Option<DateTime<Utc>>,
    items: &'a ItemMap,
}

/// Locations of the two store documents.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub items: PathBuf,
    pub visited: PathBuf,
}

impl StorePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            items: dir.join(ITEMS_FILE),
            visited: dir.join(VISITED_FILE),
        }
    }
}

/// Load records and checkpoint. A missing file is an empty store.
pub fn load_items(path: &Path) -> Result<(ItemMap, Option<DateTime<Utc>>), StoreError> {
    let file: ItemsFile = load_json(path)?.unwrap_or_default();
    Ok((file.items, file.checkpoint))
}

/// Load visited markers. A missing file means nothing was visited yet.
pub fn load_visited(path: &Path) -> Result<VisitedMap, StoreError> {
    Ok(load_json(path)?.unwrap_or_default())
}

pub fn save_items(
    path: &Path,
    items: &ItemMap,
    checkpoint: Option<DateTime<Utc>>,
) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(&ItemsFileRef { checkpoint, items })
        .map_err(StoreError::Encode)?;
    write_atomic(path, &json)
}

pub fn save_visited(path: &Path, visited: &VisitedMap) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(visited).map_err(StoreError::Encode)?;
    write_atomic(path, &json)
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::Io {
                path: path.to_owned(),
                source: e,
            });
        }
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::Decode {
            path: path.to_owned(),
            source: e,
        })
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let temp = path.with_extension("json.tmp");
    let io_err = |source| StoreError::Io {
        path: temp.clone(),
        source,
    };

    let written = fs::File::create(&temp).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });
    if let Err(e) = written {
        cleanup_temp_file(&temp, &e);
        return Err(io_err(e));
    }

    if let Err(e) = fs::rename(&temp, path) {
        cleanup_temp_file(&temp, &e);
        return Err(StoreError::Io {
            path: path.to_owned(),
            source: e,
        });
    }
    Ok(())
}

fn cleanup_temp_file(temp: &Path, original_error: &std::io::Error) {
    if let Err(cleanup_err) = fs::remove_file(temp) {
        tracing::warn!(
            "store: failed to remove {} after write error ({original_error}): {cleanup_err}",
            temp.display()
        );
    }
}
