//! Application Layer
//!
//! Orchestrates between the CLI and the domain/store/infra layers.
//!
//! - `dispatch_service`: one allocation run, end to end
//! - `ledger_service`: ledger maintenance and stored-data queries

pub mod dispatch_service;
pub mod ledger_service;

pub use dispatch_service::{
    execute_run, DispatchService, RunInputs, RunOptions, RunOutcome, RunTables,
};
pub use ledger_service::{export_ledger_workbook, ledger_stats, recent_runs, regroup_ledger, LedgerStats};
