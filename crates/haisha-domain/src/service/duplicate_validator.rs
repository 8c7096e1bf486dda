//! Duplicate vehicle detection

use std::collections::HashMap;

use haisha_types::ConflictMode;
use tracing::warn;

use crate::model::{Assignment, ConflictEntry, ConflictGroup, ConflictReport, Severity};

/// Flags vehicles that appear in more assignments than allowed.
///
/// Read-only: it reports, the caller decides what to do with the ledger.
pub struct DuplicateValidator {
    mode: ConflictMode,
    max_per_resource: usize,
}

impl Default for DuplicateValidator {
    fn default() -> Self {
        Self::new(ConflictMode::Warning, 1)
    }
}

impl DuplicateValidator {
    pub fn new(mode: ConflictMode, max_per_resource: usize) -> Self {
        Self {
            mode,
            max_per_resource: max_per_resource.max(1),
        }
    }

    pub fn mode(&self) -> ConflictMode {
        self.mode
    }

    /// Single grouping pass over the assignments.
    ///
    /// Groups keep first-appearance order, and entries within a group keep
    /// assignment order.
    pub fn validate(&self, assignments: &[Assignment]) -> ConflictReport {
        let severity = match self.mode {
            ConflictMode::Warning => Severity::Warning,
            ConflictMode::Strict => Severity::Blocking,
        };

        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<ConflictEntry>> = HashMap::new();
        for assignment in assignments {
            let entries = groups
                .entry(assignment.resource_id.as_str())
                .or_insert_with(|| {
                    order.push(assignment.resource_id.as_str());
                    Vec::new()
                });
            entries.push(ConflictEntry {
                route_code: assignment.route_code.clone(),
                driver_name: assignment.driver_name.clone(),
            });
        }

        let mut report = ConflictReport::empty(severity);
        for resource_id in order {
            let Some(entries) = groups.remove(resource_id) else {
                continue;
            };
            if entries.len() > self.max_per_resource {
                warn!(
                    resource_id,
                    routes = entries.len(),
                    severity = severity.label(),
                    "vehicle assigned to more routes than allowed"
                );
                report.groups.push(ConflictGroup {
                    resource_id: resource_id.to_string(),
                    entries,
                });
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::logical_id;
    use chrono::NaiveDate;

    fn assignment(route: &str, resource: &str, driver: &str) -> Assignment {
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        Assignment {
            run_date: date,
            route_code: route.to_string(),
            service_type: "Standard Parcel".to_string(),
            category: "Large".to_string(),
            resource_id: resource.to_string(),
            driver_name: driver.to_string(),
            wave: "10:20".to_string(),
            staging_location: "STG.A1".to_string(),
            provider: "ACME".to_string(),
            logical_id: logical_id(date, route, driver, resource),
        }
    }

    #[test]
    fn test_no_conflicts() {
        let report = DuplicateValidator::default()
            .validate(&[assignment("CX1", "V1", "A"), assignment("CX2", "V2", "B")]);
        assert!(!report.has_conflicts());
        assert!(!report.is_blocking());
    }

    #[test]
    fn test_scenario_b_single_group_of_two() {
        let assignments = vec![
            assignment("CX1", "V1", "Sato"),
            assignment("CX2", "V2", "Suzuki"),
            assignment("CX3", "V1", "Tanaka"),
        ];
        let report = DuplicateValidator::default().validate(&assignments);
        assert_eq!(report.len(), 1);
        let group = &report.groups[0];
        assert_eq!(group.resource_id, "V1");
        assert_eq!(group.size(), 2);
        assert_eq!(group.route_codes(), vec!["CX1", "CX3"]);
        assert_eq!(group.entries[1].driver_name, "Tanaka");
        assert_eq!(report.severity, Severity::Warning);
        assert!(!report.is_blocking());
    }

    #[test]
    fn test_strict_mode_blocks() {
        let report = DuplicateValidator::new(ConflictMode::Strict, 1)
            .validate(&[assignment("CX1", "V1", "A"), assignment("CX2", "V1", "B")]);
        assert!(report.is_blocking());

        let clean = DuplicateValidator::new(ConflictMode::Strict, 1)
            .validate(&[assignment("CX1", "V1", "A")]);
        assert!(!clean.is_blocking());
    }

    #[test]
    fn test_limit_above_one() {
        let assignments = vec![
            assignment("CX1", "V1", "A"),
            assignment("CX2", "V1", "B"),
            assignment("CX3", "V2", "C"),
            assignment("CX4", "V2", "D"),
            assignment("CX5", "V2", "E"),
        ];
        let report = DuplicateValidator::new(ConflictMode::Warning, 2).validate(&assignments);
        assert_eq!(report.len(), 1);
        assert_eq!(report.groups[0].resource_id, "V2");
        assert_eq!(report.groups[0].size(), 3);
    }

    #[test]
    fn test_group_order_follows_first_appearance() {
        let assignments = vec![
            assignment("CX1", "V9", "A"),
            assignment("CX2", "V1", "B"),
            assignment("CX3", "V1", "C"),
            assignment("CX4", "V9", "D"),
        ];
        let report = DuplicateValidator::default().validate(&assignments);
        let ids: Vec<_> = report.groups.iter().map(|g| g.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["V9", "V1"]);
    }
}
