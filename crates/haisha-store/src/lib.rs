//! Persistent stores for the dispatch ledger and run history

pub mod history;
pub mod ledger;
mod lock;

pub use history::{fingerprint, InputFileRef, RunHistoryStore, RunRecord, HISTORY_FILE};
pub use ledger::{FileLedgerStore, LAYOUT_FILE, LEDGER_FILE, LOCK_FILE};
