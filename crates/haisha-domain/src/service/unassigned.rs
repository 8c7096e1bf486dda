//! Operational vehicles that received no route

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::model::{Assignment, LastSeen, LedgerRow, ResourceItem, UnassignedItem};

/// Most recent ledger date per vehicle.
///
/// Built with one pass over the ledger so each lookup afterwards is O(1).
/// Rows dated after `as_of` are ignored, which keeps backfilled future runs
/// from producing negative day counts.
#[derive(Debug, Clone, Default)]
pub struct LastSeenIndex {
    as_of: Option<NaiveDate>,
    last: HashMap<String, NaiveDate>,
}

impl LastSeenIndex {
    pub fn build(rows: &[LedgerRow], as_of: NaiveDate) -> Self {
        let mut last: HashMap<String, NaiveDate> = HashMap::new();
        for row in rows.iter().filter(|r| r.run_date <= as_of) {
            last.entry(row.resource_id.clone())
                .and_modify(|seen| {
                    if row.run_date > *seen {
                        *seen = row.run_date;
                    }
                })
                .or_insert(row.run_date);
        }
        Self {
            as_of: Some(as_of),
            last,
        }
    }

    pub fn last_date(&self, resource_id: &str) -> Option<NaiveDate> {
        self.last.get(resource_id).copied()
    }

    pub fn last_seen(&self, resource_id: &str) -> LastSeen {
        match (self.as_of, self.last_date(resource_id)) {
            (Some(as_of), Some(date)) => LastSeen::Days((as_of - date).num_days()),
            _ => LastSeen::NoHistory,
        }
    }
}

/// Operational vehicles not used by any assignment, in inventory order
pub fn compute_unassigned(
    resources: &[ResourceItem],
    assignments: &[Assignment],
    history: &LastSeenIndex,
) -> Vec<UnassignedItem> {
    let assigned: HashSet<&str> = assignments.iter().map(|a| a.resource_id.as_str()).collect();
    resources
        .iter()
        .filter(|r| r.operational && !assigned.contains(r.resource_id.as_str()))
        .map(|r| UnassignedItem {
            resource_id: r.resource_id.clone(),
            category: r.category.clone(),
            details: r.details.clone(),
            last_seen: history.last_seen(&r.resource_id),
        })
        .collect()
}
