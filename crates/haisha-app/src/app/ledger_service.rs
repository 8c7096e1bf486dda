//! Ledger Service - maintenance and read-only queries
//!
//! - Re-export the ledger workbook
//! - Full regrouping of date sections
//! - Ledger statistics
//! - Run history

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use haisha_domain::model::LedgerRow;
use haisha_domain::repository::LedgerStore;
use haisha_domain::service::{sections, LedgerWriter};
use haisha_store::RunRecord;
use haisha_types::{GroupingMode, Result};
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::export::export_ledger;
use crate::repository::{open_history_store, open_ledger, open_ledger_read_only};

/// Ledger overview
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerStats {
    pub total_rows: usize,
    pub sections: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub distinct_vehicles: usize,
    pub distinct_drivers: usize,
    /// Row count per run date
    pub rows_per_date: BTreeMap<NaiveDate, usize>,
}

impl LedgerStats {
    pub fn from_store<S: LedgerStore + ?Sized>(store: &S) -> Self {
        let rows = store.rows();
        let mut rows_per_date = BTreeMap::new();
        for row in rows {
            *rows_per_date.entry(row.run_date).or_insert(0) += 1;
        }

        Self {
            total_rows: rows.len(),
            sections: sections(store.layout()).len(),
            first_date: rows.iter().map(|r| r.run_date).min(),
            last_date: rows.iter().map(|r| r.run_date).max(),
            distinct_vehicles: distinct(rows, |r| r.resource_id.as_str()),
            distinct_drivers: distinct(rows, |r| r.driver_name.as_str()),
            rows_per_date,
        }
    }
}

fn distinct<'a>(rows: &'a [LedgerRow], key: impl Fn(&'a LedgerRow) -> &'a str) -> usize {
    rows.iter().map(key).collect::<HashSet<_>>().len()
}

impl std::fmt::Display for LedgerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Ledger Statistics")?;
        writeln!(f, "=================")?;
        writeln!(f, "Rows:              {}", self.total_rows)?;
        writeln!(f, "Date sections:     {}", self.sections)?;
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => writeln!(f, "Date range:        {} .. {}", first, last)?,
            _ => writeln!(f, "Date range:        -")?,
        }
        writeln!(f, "Vehicles:          {}", self.distinct_vehicles)?;
        writeln!(f, "Drivers:           {}", self.distinct_drivers)?;
        Ok(())
    }
}

/// Statistics of the configured ledger
pub fn ledger_stats(config: &Config) -> Result<LedgerStats> {
    let ledger = open_ledger_read_only(config)?;
    Ok(LedgerStats::from_store(&ledger))
}

/// Write the configured ledger to a bordered workbook
pub fn export_ledger_workbook(config: &Config, output_path: &Path) -> Result<usize> {
    let ledger = open_ledger_read_only(config)?;
    export_ledger(ledger.rows(), ledger.layout(), output_path)?;
    info!(rows = ledger.len(), path = %output_path.display(), "ledger workbook written");
    Ok(ledger.len())
}

/// Recompute every date section of the configured ledger; returns the section count
pub fn regroup_ledger(config: &Config) -> Result<usize> {
    let mut ledger = open_ledger(config)?;
    let sections = LedgerWriter::new(GroupingMode::Full).regroup_all(&mut ledger)?;
    info!(rows = ledger.len(), sections, "ledger regrouped");
    Ok(sections)
}

/// Most recent runs, newest first
pub fn recent_runs(config: &Config, limit: usize) -> Result<Vec<RunRecord>> {
    let history = open_history_store(config)?;
    Ok(history.recent(limit).into_iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use haisha_domain::model::{iso_week, logical_id, ExternalFields};
    use haisha_domain::repository::MemoryLedger;
    use haisha_domain::service::group_full;

    fn row(day: u32, route: &str, vehicle: &str, driver: &str) -> LedgerRow {
        let run_date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        LedgerRow {
            run_date,
            week_number: iso_week(run_date),
            route_code: route.to_string(),
            service_type: "Standard Parcel".to_string(),
            category: "Large".to_string(),
            resource_id: vehicle.to_string(),
            driver_name: driver.to_string(),
            wave: String::new(),
            staging_location: String::new(),
            provider: "ACME".to_string(),
            logical_id: logical_id(run_date, route, driver, vehicle),
            external: ExternalFields::default(),
        }
    }

    #[test]
    fn test_stats() {
        let rows = vec![
            row(6, "CX1", "V1", "Sato"),
            row(6, "CX2", "V2", "Suzuki"),
            row(7, "CX1", "V1", "Sato"),
        ];
        let mut ledger = MemoryLedger::with_rows(rows);
        let dates: Vec<NaiveDate> = ledger.rows().iter().map(|r| r.run_date).collect();
        ledger.store_layout(group_full(&dates)).unwrap();

        let stats = LedgerStats::from_store(&ledger);
        assert_eq!(stats.total_rows, 3);
        assert_eq!(stats.sections, 2);
        assert_eq!(stats.distinct_vehicles, 2);
        assert_eq!(stats.distinct_drivers, 2);
        assert_eq!(stats.first_date, NaiveDate::from_ymd_opt(2024, 5, 6));
        assert_eq!(stats.rows_per_date.values().copied().collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn test_stats_empty() {
        let stats = LedgerStats::from_store(&MemoryLedger::new());
        assert_eq!(stats, LedgerStats::default());
    }
}
