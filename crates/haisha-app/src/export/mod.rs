//! Workbook export

pub mod excel;

pub use excel::{export_ledger, export_run_results};
