use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pull request number, unique within the mirrored repository.
pub type ItemId = u64;

/// Visited markers keyed by item id.
pub type VisitedMap = BTreeMap<ItemId, DateTime<Utc>>;

/// Item records keyed by item id.
pub type ItemMap = BTreeMap<ItemId, ItemRecord>;

/// Marker value meaning "never visited": the Unix epoch, older than any
/// timestamp GitHub reports.
pub const NEVER_VISITED: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

/// Which pull requests a listing asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemScope {
    /// Open pull requests only (first-run bootstrap).
    Open,
    /// Open and closed pull requests.
    All,
}

impl ItemScope {
    /// Value of the REST `state` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::All => "all",
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One pull request as listed by the remote, before its changed files are
/// known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: ItemId,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub state: ItemState,
}

impl ItemSummary {
    /// Attach the changed-file list (absent when it could not be fetched).
    pub fn into_record(self, changed_files: Option<Vec<String>>) -> ItemRecord {
        ItemRecord {
            url: self.url,
            title: self.title,
            description: self.description,
            updated_at: self.updated_at,
            changed_files,
            state: self.state,
        }
    }
}

/// Cached metadata for one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// `None` when the changed-file listing failed during sync.
    #[serde(default)]
    pub changed_files: Option<Vec<String>>,
    pub state: ItemState,
}

impl ItemRecord {
    /// Changed files, treating an absent list as empty.
    pub fn files(&self) -> &[String] {
        self.changed_files.as_deref().unwrap_or_default()
    }
}
