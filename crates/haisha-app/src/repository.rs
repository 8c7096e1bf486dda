//! Store adapters for the persistence layer

use std::path::PathBuf;

use haisha_store::{FileLedgerStore, RunHistoryStore};
use haisha_types::Result;

use crate::config::Config;

/// Open the configured ledger for writing (takes the ledger lock)
pub fn open_ledger(config: &Config) -> Result<FileLedgerStore> {
    FileLedgerStore::open(config.ledger_dir()?)
}

/// Open the configured ledger without the lock
pub fn open_ledger_read_only(config: &Config) -> Result<FileLedgerStore> {
    FileLedgerStore::open_read_only(config.ledger_dir()?)
}

/// Open a ledger at a custom directory for writing
pub fn open_ledger_at(ledger_dir: PathBuf) -> Result<FileLedgerStore> {
    FileLedgerStore::open(ledger_dir)
}

/// Open run history
pub fn open_history_store(config: &Config) -> Result<RunHistoryStore> {
    RunHistoryStore::open(config.store_dir()?)
}

/// Open run history at a custom directory
pub fn open_history_store_at(store_dir: PathBuf) -> Result<RunHistoryStore> {
    RunHistoryStore::open(store_dir)
}
