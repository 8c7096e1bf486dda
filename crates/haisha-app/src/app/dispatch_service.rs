//! Dispatch Service - core use case for one allocation run
//!
//! This service orchestrates the run:
//! 1. Load the input sheets
//! 2. Normalize them against the synonym table and category mapping
//! 3. Allocate vehicles to routes and attach drivers
//! 4. Validate duplicate vehicle usage
//! 5. Compute unassigned vehicles against the ledger history
//! 6. Summarize and write the result workbook
//! 7. Append to the ledger (skipped for blocked or dry runs)
//! 8. Record the run in history, then re-export the ledger workbook
//!
//! Nothing touches the ledger until steps 1-6 succeeded, and once it was
//! touched the run is recorded before anything else can fail.

use std::path::PathBuf;

use chrono::NaiveDate;
use haisha_domain::model::{Assignment, LedgerRow, RawTable, UnassignedItem};
use haisha_domain::repository::LedgerStore;
use haisha_domain::service::{
    compute_unassigned, summarize, Allocator, AppendReport, DuplicateValidator, LastSeenIndex,
    LedgerWriter, Normalizer, NormalizerConfig, RunStatus, RunSummary, UnmatchedRoute,
};
use haisha_infra::load_table;
use haisha_store::{fingerprint, InputFileRef};
use haisha_types::{ConflictMode, GroupingMode, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::export::{export_ledger, export_run_results};
use crate::repository::{open_history_store, open_ledger, open_ledger_read_only};

/// Input file paths of one run
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub routes: PathBuf,
    pub drivers: PathBuf,
    pub inventory: PathBuf,
    pub details: Option<PathBuf>,
}

impl RunInputs {
    fn files(&self) -> Vec<(&'static str, &PathBuf)> {
        let mut files = vec![
            ("routes", &self.routes),
            ("drivers", &self.drivers),
            ("inventory", &self.inventory),
        ];
        if let Some(ref details) = self.details {
            files.push(("details", details));
        }
        files
    }

    /// References with content hashes, for the run history
    pub fn file_refs(&self) -> Result<Vec<InputFileRef>> {
        self.files()
            .into_iter()
            .map(|(role, path)| {
                Ok(InputFileRef {
                    role: role.to_string(),
                    path: path.display().to_string(),
                    sha256: fingerprint(path)?,
                })
            })
            .collect()
    }
}

/// Raw input tables of one run
#[derive(Debug, Clone)]
pub struct RunTables {
    pub routes: RawTable,
    pub drivers: RawTable,
    pub inventory: RawTable,
    pub details: Option<RawTable>,
}

impl RunTables {
    pub fn load(inputs: &RunInputs) -> Result<Self> {
        Ok(Self {
            routes: load_table(&inputs.routes, "route plan")?,
            drivers: load_table(&inputs.drivers, "driver roster")?,
            inventory: load_table(&inputs.inventory, "vehicle inventory")?,
            details: inputs
                .details
                .as_ref()
                .map(|path| load_table(path, "vehicle details"))
                .transpose()?,
        })
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub assignments: Vec<Assignment>,
    pub unmatched: Vec<UnmatchedRoute>,
    pub unassigned: Vec<UnassignedItem>,
    /// `None` when the ledger was not written
    pub append: Option<AppendReport>,
    /// Set once the run is recorded in history
    pub run_id: Option<String>,
}

pub struct DispatchService {
    normalizer: Normalizer,
    allocator: Allocator,
    validator: DuplicateValidator,
    writer: LedgerWriter,
}

impl DispatchService {
    pub fn new(
        normalizer_config: NormalizerConfig,
        conflict_mode: ConflictMode,
        max_per_vehicle: usize,
        grouping: GroupingMode,
    ) -> Self {
        Self {
            normalizer: Normalizer::new(normalizer_config),
            allocator: Allocator::new(max_per_vehicle),
            validator: DuplicateValidator::new(conflict_mode, max_per_vehicle),
            writer: LedgerWriter::new(grouping),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            config.normalizer_config()?,
            config.conflict_mode,
            config.max_assignments_per_vehicle,
            config.grouping_mode,
        ))
    }

    /// Run everything up to (not including) the ledger append.
    ///
    /// `history` is the current ledger, read for days-since-last-assignment.
    pub fn plan(&self, tables: &RunTables, run_date: NaiveDate, history: &[LedgerRow]) -> Result<RunOutcome> {
        let input = self.normalizer.normalize(
            &tables.routes,
            &tables.drivers,
            &tables.inventory,
            tables.details.as_ref(),
        )?;

        let allocation = self.allocator.allocate(&input.routes, &input.inventory);
        let (assignments, driver_issues) =
            self.allocator
                .attach_drivers(&allocation, &input.roster, run_date);
        let conflicts = self.validator.validate(&assignments);

        let index = LastSeenIndex::build(history, run_date);
        let unassigned = compute_unassigned(&input.inventory, &assignments, &index);

        let mut issues = input.issues.clone();
        issues.extend(driver_issues);
        let summary = summarize(
            run_date,
            &input,
            &allocation,
            &assignments,
            &conflicts,
            &unassigned,
            issues,
        );

        info!(
            %run_date,
            routes = summary.total_routes,
            matched = summary.matched,
            unmatched = summary.unmatched,
            conflicts = summary.conflict_count,
            "allocation finished"
        );

        Ok(RunOutcome {
            summary,
            assignments,
            unmatched: allocation.unmatched,
            unassigned,
            append: None,
            run_id: None,
        })
    }

    /// Plan, then append to `store` unless the run is blocked
    pub fn run<S: LedgerStore + ?Sized>(
        &self,
        tables: &RunTables,
        run_date: NaiveDate,
        store: &mut S,
        force_ledger: bool,
    ) -> Result<RunOutcome> {
        let mut outcome = self.plan(tables, run_date, store.rows())?;
        self.commit(&mut outcome, store, force_ledger)?;
        Ok(outcome)
    }

    /// Append a planned outcome to `store`.
    ///
    /// A strict-mode conflict blocks the append unless `force_ledger` is set;
    /// a blocked outcome keeps `append` at `None`.
    pub fn commit<S: LedgerStore + ?Sized>(
        &self,
        outcome: &mut RunOutcome,
        store: &mut S,
        force_ledger: bool,
    ) -> Result<()> {
        let run_date = outcome.summary.run_date;
        if outcome.summary.status == RunStatus::Failed && !force_ledger {
            warn!(%run_date, "run blocked by vehicle conflicts, ledger not written");
            return Ok(());
        }

        outcome.append = Some(self.writer.append(store, &outcome.assignments, run_date)?);
        Ok(())
    }
}

/// Options for one CLI-level run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub run_date: NaiveDate,
    /// Allocate and report without writing the ledger or history
    pub dry_run: bool,
    /// Append even when strict mode marked the run failed
    pub force_ledger: bool,
    /// Result workbook path
    pub output: Option<PathBuf>,
    /// Re-export the whole ledger workbook after appending
    pub ledger_workbook: Option<PathBuf>,
}

/// Load inputs, run, export, and record history
pub fn execute_run(config: &Config, inputs: &RunInputs, options: &RunOptions) -> Result<RunOutcome> {
    let service = DispatchService::from_config(config)?;
    let tables = RunTables::load(inputs)?;

    if options.dry_run {
        let ledger = open_ledger_read_only(config)?;
        let outcome = service.plan(&tables, options.run_date, ledger.rows())?;
        write_result_workbook(&outcome, options)?;
        return Ok(outcome);
    }

    // Everything that can fail without side effects happens before the append
    let file_refs = inputs.file_refs()?;
    let mut history = open_history_store(config)?;
    let mut ledger = open_ledger(config)?;
    let mut outcome = service.plan(&tables, options.run_date, ledger.rows())?;
    write_result_workbook(&outcome, options)?;

    service.commit(&mut outcome, &mut ledger, options.force_ledger)?;
    let run_id = history.record(outcome.summary.clone(), file_refs, outcome.append.clone())?;
    outcome.run_id = Some(run_id);

    if let Some(ref path) = options.ledger_workbook {
        export_ledger(ledger.rows(), ledger.layout(), path)?;
        info!(path = %path.display(), "ledger workbook written");
    }

    Ok(outcome)
}

fn write_result_workbook(outcome: &RunOutcome, options: &RunOptions) -> Result<()> {
    if let Some(ref path) = options.output {
        export_run_results(outcome, path)?;
        info!(path = %path.display(), "result workbook written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use haisha_domain::model::{CategoryMapping, SynonymTable};
    use haisha_domain::repository::MemoryLedger;

    fn tables() -> RunTables {
        RunTables {
            routes: RawTable::from_rows(
                "route plan",
                &["Route", "Service Type", "DSP"],
                &[&["CX1", "Standard Parcel", "ACME"], &["CX2", "Standard Parcel", "ACME"]],
            ),
            drivers: RawTable::from_rows("roster", &["Route", "Driver"], &[&["CX1", "Sato"], &["CX2", "Suzuki"]]),
            inventory: RawTable::from_rows(
                "inventory",
                &["Vehicle", "Category", "Status"],
                &[&["V1", "Large", "OPERATIONAL"], &["V2", "Large", "OPERATIONAL"]],
            ),
            details: None,
        }
    }

    fn service(mode: ConflictMode, max_per_vehicle: usize) -> DispatchService {
        DispatchService::new(
            NormalizerConfig {
                provider_filter: Some("ACME".to_string()),
                operational_value: "OPERATIONAL".to_string(),
                category_mapping: CategoryMapping::from_pairs([("Standard Parcel", "Large")]),
                synonyms: SynonymTable::default(),
            },
            mode,
            max_per_vehicle,
            GroupingMode::Incremental,
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    #[test]
    fn test_run_appends() {
        let mut ledger = MemoryLedger::new();
        let outcome = service(ConflictMode::Warning, 1)
            .run(&tables(), date(), &mut ledger, false)
            .unwrap();
        assert_eq!(outcome.assignments.len(), 2);
        assert_eq!(outcome.append.as_ref().unwrap().appended, 2);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_plan_does_not_touch_ledger() {
        let ledger = MemoryLedger::new();
        let outcome = service(ConflictMode::Warning, 1)
            .plan(&tables(), date(), ledger.rows())
            .unwrap();
        assert!(outcome.append.is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_schema_error_leaves_ledger_untouched() {
        let mut bad = tables();
        bad.inventory = RawTable::from_rows("inventory", &["Vehicle", "Category"], &[]);
        let mut ledger = MemoryLedger::new();
        let result = service(ConflictMode::Warning, 1).run(&bad, date(), &mut ledger, false);
        assert!(matches!(result, Err(haisha_types::Error::Schema(_))));
        assert!(ledger.is_empty());
    }
}
