//! Idempotent ledger append
//!
//! One call walks through: scan existing identifiers, filter out rows that are
//! already stored, insert the rest in one all-or-nothing append, then run the
//! date-section grouping pass. Grouping only happens after the insert
//! succeeded, so a failed append never leaves a half-grouped ledger.

use std::collections::HashSet;

use chrono::NaiveDate;
use haisha_types::{Error, GroupingMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::{iso_week, logical_id, Assignment, LedgerRow};
use crate::repository::LedgerStore;
use crate::service::date_sections::{
    group_full, sections, tail_boundaries, tail_start,
};

/// Outcome of one append call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendReport {
    pub run_date: NaiveDate,
    /// Rows written by this call
    pub appended: usize,
    /// Assignments whose identifier was already present (not re-appended)
    pub skipped_duplicates: usize,
    pub skipped_ids: Vec<String>,
    /// Index of the first row written by this call
    pub first_new_row: Option<usize>,
    /// Ledger size after the call
    pub total_rows: usize,
    /// Rows whose boundary was recomputed by the grouping pass
    pub regrouped_rows: usize,
    /// Date sections in the ledger after the call
    pub sections: usize,
}

pub struct LedgerWriter {
    grouping: GroupingMode,
}

impl Default for LedgerWriter {
    fn default() -> Self {
        Self::new(GroupingMode::Incremental)
    }
}

impl LedgerWriter {
    pub fn new(grouping: GroupingMode) -> Self {
        Self { grouping }
    }

    /// Append assignments for `run_date`, skipping any already in the ledger.
    ///
    /// Re-running the same assignments against the same ledger appends nothing.
    pub fn append<S: LedgerStore + ?Sized>(
        &self,
        store: &mut S,
        assignments: &[Assignment],
        run_date: NaiveDate,
    ) -> Result<AppendReport, Error> {
        // Scanning existing identifiers
        let mut known: HashSet<String> = store
            .rows()
            .iter()
            .map(|row| row.logical_id.clone())
            .collect();

        // Filtering new rows
        let mut new_rows = Vec::new();
        let mut skipped_ids = Vec::new();
        for assignment in assignments {
            let id = logical_id(
                run_date,
                &assignment.route_code,
                &assignment.driver_name,
                &assignment.resource_id,
            );
            if !known.insert(id.clone()) {
                debug!(logical_id = %id, "already in ledger, not re-appended");
                skipped_ids.push(id);
                continue;
            }
            let mut row = LedgerRow::from_assignment(assignment);
            row.run_date = run_date;
            row.week_number = iso_week(run_date);
            row.logical_id = id;
            new_rows.push(row);
        }

        // Inserting rows
        let first_new = store.len();
        let appended = new_rows.len();
        if appended > 0 {
            store.append_rows(new_rows)?;
        }

        // Grouping pass
        let regrouped_rows = self.regroup(store, first_new)?;
        let total_rows = store.len();

        info!(
            %run_date,
            appended,
            skipped = skipped_ids.len(),
            total_rows,
            "ledger append finished"
        );

        Ok(AppendReport {
            run_date,
            appended,
            skipped_duplicates: skipped_ids.len(),
            skipped_ids,
            first_new_row: (appended > 0).then_some(first_new),
            total_rows,
            regrouped_rows,
            sections: sections(store.layout()).len(),
        })
    }

    /// Rebuild the boundaries of the whole ledger; returns the section count
    pub fn regroup_all<S: LedgerStore + ?Sized>(&self, store: &mut S) -> Result<usize, Error> {
        let layout = group_full(&row_dates(store.rows()));
        let count = sections(&layout).len();
        if &layout != store.layout() {
            store.store_layout(layout)?;
        }
        Ok(count)
    }

    /// Returns how many rows had their boundary recomputed
    fn regroup<S: LedgerStore + ?Sized>(&self, store: &mut S, first_new: usize) -> Result<usize, Error> {
        match self.grouping {
            GroupingMode::Full => {
                let layout = group_full(&row_dates(store.rows()));
                let recomputed = layout.len();
                if &layout != store.layout() {
                    store.store_layout(layout)?;
                }
                Ok(recomputed)
            }
            GroupingMode::Incremental => {
                // Only rows from `start` on are read, compared and written
                let rows = store.rows();
                let start = tail_start(store.layout(), first_new, rows.len());
                let prev = start.checked_sub(1).map(|i| rows[i].run_date);
                let tail = tail_boundaries(prev, &row_dates(&rows[start..]));
                let recomputed = tail.len();
                let stored = store.layout().boundaries();
                if stored.len() != rows.len() || stored[start..] != tail[..] {
                    store.store_layout_tail(start, tail)?;
                }
                Ok(recomputed)
            }
        }
    }
}

fn row_dates(rows: &[LedgerRow]) -> Vec<NaiveDate> {
    rows.iter().map(|row| row.run_date).collect()
}
