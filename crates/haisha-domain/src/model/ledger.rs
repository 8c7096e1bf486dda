//! Historical ledger rows

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::assignment::Assignment;

/// ISO 8601 week number of a date
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Columns filled in later by the depot team (blank when the row is written)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFields {
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub return_time: Option<String>,
    #[serde(default)]
    pub odometer_start: Option<String>,
    #[serde(default)]
    pub odometer_end: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// One appended ledger record. Never rewritten once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub run_date: NaiveDate,
    /// ISO week of `run_date`, fixed at write time
    pub week_number: u32,
    pub route_code: String,
    pub service_type: String,
    pub category: String,
    pub resource_id: String,
    pub driver_name: String,
    pub wave: String,
    pub staging_location: String,
    pub provider: String,
    pub logical_id: String,
    #[serde(default)]
    pub external: ExternalFields,
}

impl LedgerRow {
    pub fn from_assignment(assignment: &Assignment) -> Self {
        Self {
            run_date: assignment.run_date,
            week_number: iso_week(assignment.run_date),
            route_code: assignment.route_code.clone(),
            service_type: assignment.service_type.clone(),
            category: assignment.category.clone(),
            resource_id: assignment.resource_id.clone(),
            driver_name: assignment.driver_name.clone(),
            wave: assignment.wave.clone(),
            staging_location: assignment.staging_location.clone(),
            provider: assignment.provider.clone(),
            logical_id: assignment.logical_id.clone(),
            external: ExternalFields::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_week() {
        // 2024-12-30 belongs to ISO week 1 of 2025
        assert_eq!(iso_week(NaiveDate::from_ymd_opt(2024, 12, 30).unwrap()), 1);
        assert_eq!(iso_week(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()), 19);
        // 2021-01-03 is still in week 53 of 2020
        assert_eq!(iso_week(NaiveDate::from_ymd_opt(2021, 1, 3).unwrap()), 53);
    }
}
