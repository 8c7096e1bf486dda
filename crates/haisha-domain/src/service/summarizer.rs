//! Run summary

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Assignment, ConflictReport, RunIssue, UnassignedItem};
use crate::service::allocator::{Allocation, UnmatchedReason};
use crate::service::normalizer::NormalizedInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    /// Strict conflict mode found duplicate vehicle usage
    Failed,
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

/// Immutable record of one allocation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_date: NaiveDate,
    /// Routes of the configured provider (denominator of the allocation rate)
    pub total_routes: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Not allocated: no vehicle of the category left
    pub unmatched_shortage: usize,
    /// Not allocated: service type without category mapping
    pub unmatched_category: usize,
    /// Allocated, but the roster had no driver for the route
    pub missing_driver: usize,
    /// Plan rows of other providers
    pub dropped_routes: usize,
    pub inventory_total: usize,
    pub operational_total: usize,
    pub unassigned: usize,
    pub conflict_count: usize,
    /// matched / total_routes, 0.0 for an empty plan
    pub allocation_rate: f64,
    pub status: RunStatus,
    pub conflicts: ConflictReport,
    pub issues: Vec<RunIssue>,
}

pub fn summarize(
    run_date: NaiveDate,
    input: &NormalizedInput,
    allocation: &Allocation,
    assignments: &[Assignment],
    conflicts: &ConflictReport,
    unassigned: &[UnassignedItem],
    issues: Vec<RunIssue>,
) -> RunSummary {
    let total_routes = input.routes.len();
    let matched = assignments.len();
    let allocation_rate = if total_routes == 0 {
        0.0
    } else {
        matched as f64 / total_routes as f64
    };
    let status = if conflicts.is_blocking() {
        RunStatus::Failed
    } else {
        RunStatus::Completed
    };

    RunSummary {
        run_date,
        total_routes,
        matched,
        unmatched: allocation.unmatched.len(),
        unmatched_shortage: allocation.unmatched_by(UnmatchedReason::ResourceShortage),
        unmatched_category: allocation.unmatched_by(UnmatchedReason::CategoryUnresolved),
        missing_driver: assignments.iter().filter(|a| a.is_driver_missing()).count(),
        dropped_routes: input.dropped_routes,
        inventory_total: input.inventory.len(),
        operational_total: input.operational_count(),
        unassigned: unassigned.len(),
        conflict_count: conflicts.len(),
        allocation_rate,
        status,
        conflicts: conflicts.clone(),
        issues,
    }
}

pub fn generate_summary_report(summary: &RunSummary) -> String {
    let mut report = String::new();
    report.push_str("==================================================\n");
    report.push_str("              配車レポート / Dispatch Report        \n");
    report.push_str("==================================================\n\n");
    report.push_str(&format!("  Run date:                  {}\n", summary.run_date));
    report.push_str(&format!("  Status:                    {}\n\n", summary.status.label()));

    report.push_str("【Routes】\n");
    report.push_str(&format!("  Total routes:              {}\n", summary.total_routes));
    report.push_str(&format!("  Matched:                   {}\n", summary.matched));
    report.push_str(&format!("  Unmatched:                 {}\n", summary.unmatched));
    report.push_str(&format!("    - vehicle shortage:      {}\n", summary.unmatched_shortage));
    report.push_str(&format!("    - unknown service type:  {}\n", summary.unmatched_category));
    report.push_str(&format!("  Missing driver data:       {}\n", summary.missing_driver));
    report.push_str(&format!("  Other providers (skipped): {}\n", summary.dropped_routes));
    report.push_str(&format!(
        "  Allocation rate:           {:.1}%\n\n",
        summary.allocation_rate * 100.0
    ));

    report.push_str("【Vehicles】\n");
    report.push_str(&format!("  Inventory:                 {}\n", summary.inventory_total));
    report.push_str(&format!("  Operational:               {}\n", summary.operational_total));
    report.push_str(&format!("  Unassigned:                {}\n\n", summary.unassigned));

    if summary.conflicts.has_conflicts() {
        report.push_str(&format!(
            "【Conflicts ({})】\n",
            summary.conflicts.severity.label()
        ));
        report.push_str("-".repeat(50).as_str());
        report.push('\n');
        for group in &summary.conflicts.groups {
            let competing: Vec<String> = group
                .entries
                .iter()
                .map(|e| format!("{} ({})", e.route_code, e.driver_name))
                .collect();
            report.push_str(&format!(
                "  {:<14} {}\n",
                truncate_str(&group.resource_id, 14),
                competing.join(", ")
            ));
        }
        report.push('\n');
    } else {
        report.push_str("【No Conflicts】\n\n");
    }

    if !summary.issues.is_empty() {
        report.push_str(&format!("【Issues ({})】\n", summary.issues.len()));
        for issue in &summary.issues {
            report.push_str(&format!("  [{}] {}\n", issue.label(), issue));
        }
        report.push('\n');
    }

    report.push_str("==================================================\n");
    report
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(2)).collect();
        format!("{}..", truncated)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CategoryMapping, ConflictEntry, ConflictGroup, RawTable, Severity, SynonymTable,
    };
    use crate::service::allocator::Allocator;
    use crate::service::normalizer::{Normalizer, NormalizerConfig};

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn normalized() -> NormalizedInput {
        let normalizer = Normalizer::new(NormalizerConfig {
            provider_filter: Some("ACME".to_string()),
            operational_value: "OPERATIONAL".to_string(),
            category_mapping: CategoryMapping::from_pairs([("Standard Parcel", "Large")]),
            synonyms: SynonymTable::default(),
        });
        let plan = RawTable::from_rows(
            "route plan",
            &["Route", "Service Type", "Provider"],
            &[
                &["CX1", "Standard Parcel", "ACME"],
                &["CX2", "Standard Parcel", "ACME"],
                &["CX3", "Standard Parcel", "ACME"],
                &["CX4", "Hovercraft", "ACME"],
            ],
        );
        let roster = RawTable::from_rows("roster", &["Route", "Driver"], &[&["CX1", "Sato"]]);
        let inventory = RawTable::from_rows(
            "inventory",
            &["Vehicle", "Category", "Status"],
            &[&["V1", "Large", "OPERATIONAL"], &["V2", "Large", "OPERATIONAL"]],
        );
        normalizer.normalize(&plan, &roster, &inventory, None).unwrap()
    }

    #[test]
    fn test_summary_breakdown() {
        let input = normalized();
        let allocator = Allocator::default();
        let allocation = allocator.allocate(&input.routes, &input.inventory);
        let (assignments, mut issues) = allocator.attach_drivers(&allocation, &input.roster, d());
        issues.extend(input.issues.clone());
        let conflicts = ConflictReport::empty(Severity::Warning);

        let summary = summarize(d(), &input, &allocation, &assignments, &conflicts, &[], issues);
        assert_eq!(summary.total_routes, 4);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.unmatched_shortage, 1);
        assert_eq!(summary.unmatched_category, 1);
        assert_eq!(summary.missing_driver, 1);
        assert!((summary.allocation_rate - 0.5).abs() < 1e-9);
        assert_eq!(summary.status, RunStatus::Completed);

        let report = generate_summary_report(&summary);
        assert!(report.contains("Allocation rate:           50.0%"));
        assert!(report.contains("CategoryUnresolved"));
    }

    #[test]
    fn test_empty_plan_rate_is_zero() {
        let input = NormalizedInput::default();
        let allocation = Allocation::default();
        let conflicts = ConflictReport::empty(Severity::Warning);
        let summary = summarize(d(), &input, &allocation, &[], &conflicts, &[], Vec::new());
        assert_eq!(summary.total_routes, 0);
        assert_eq!(summary.allocation_rate, 0.0);
    }

    #[test]
    fn test_blocking_conflict_fails_run() {
        let input = NormalizedInput::default();
        let conflicts = ConflictReport {
            severity: Severity::Blocking,
            groups: vec![ConflictGroup {
                resource_id: "V1".to_string(),
                entries: vec![
                    ConflictEntry {
                        route_code: "CX1".to_string(),
                        driver_name: "Sato".to_string(),
                    },
                    ConflictEntry {
                        route_code: "CX2".to_string(),
                        driver_name: "Suzuki".to_string(),
                    },
                ],
            }],
        };
        let summary = summarize(
            d(),
            &input,
            &Allocation::default(),
            &[],
            &conflicts,
            &[],
            Vec::new(),
        );
        assert_eq!(summary.status, RunStatus::Failed);
        assert_eq!(summary.conflict_count, 1);
        assert!(generate_summary_report(&summary).contains("CX1 (Sato), CX2 (Suzuki)"));
    }
}
