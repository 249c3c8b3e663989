//! Episode history ledger.
//!
//! An append-only record of what happened to each episode: snatched,
//! downloaded, subtitled, failed. Rows are written once and never read back
//! or changed here.

mod events;
mod ledger;
mod sqlite;
mod store;

pub use events::*;
pub use ledger::HistoryLedger;
pub use sqlite::SqliteHistoryStore;
pub use store::*;
