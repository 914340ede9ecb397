// engine module — incremental GitHub → store synchronization

mod interface;
mod pager;
pub mod stub;
mod sync;

pub use interface::RemoteSource;
pub use pager::{ItemPages, fetch_changed_files};
pub use stub::StubRemote;
pub use sync::{CycleOutcome, CycleReport, SyncEngine};
