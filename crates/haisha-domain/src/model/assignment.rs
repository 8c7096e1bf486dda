//! Route-to-vehicle assignment

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Composite key that makes ledger appends idempotent.
///
/// Format: `YYYY-MM-DD|route|driver|resource`. Components are trimmed so that
/// stray whitespace in a re-exported sheet does not produce a new key.
pub fn logical_id(run_date: NaiveDate, route_code: &str, driver_name: &str, resource_id: &str) -> String {
    format!(
        "{}|{}|{}|{}",
        run_date.format("%Y-%m-%d"),
        route_code.trim(),
        driver_name.trim(),
        resource_id.trim()
    )
}

/// Result of matching one route to one vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub run_date: NaiveDate,
    pub route_code: String,
    pub service_type: String,
    pub category: String,
    pub resource_id: String,
    pub driver_name: String,
    pub wave: String,
    pub staging_location: String,
    pub provider: String,
    pub logical_id: String,
}

impl Assignment {
    /// True when the roster had no driver for this route
    pub fn is_driver_missing(&self) -> bool {
        self.driver_name == super::driver::UNASSIGNED_DRIVER
    }
}
