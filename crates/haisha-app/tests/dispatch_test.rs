//! Integration tests for the allocation run
//!
//! Inputs are written as CSV into a temp dir; the ledger and run history
//! live under the same temp dir.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use haisha_app::app::{execute_run, DispatchService, RunInputs, RunOptions, RunTables};
use haisha_app::config::Config;
use haisha_app::repository::{open_history_store, open_ledger_read_only};
use haisha_domain::model::{logical_id, Assignment, RawTable, UNASSIGNED_DRIVER};
use haisha_domain::repository::{LedgerStore, MemoryLedger};
use haisha_domain::service::{
    group_full, DuplicateValidator, RunStatus, UnmatchedReason,
};
use haisha_infra::parse_table;
use haisha_store::{FileLedgerStore, LOCK_FILE};
use haisha_types::{ConflictMode, Error};
use tempfile::{tempdir, TempDir};

const ROUTES: &str = "\
Route Code,Service Type,DSP,Wave,Staging Location
CX1,Standard Parcel,ACME,10:20,STG.A1
CX2,Standard Parcel,ACME,10:20,STG.A2
CX3,Standard Parcel,ACME,10:40,STG.B1
CX9,Standard Parcel,OTHER,10:40,STG.B2
";

const DRIVERS: &str = "\
Route,Driver Name
CX1,Sato
CX2,Suzuki
CX3,Takahashi
";

const INVENTORY: &str = "\
Vehicle Name,Vehicle Type,Operational Status
V1,Large,OPERATIONAL
V2,Large,OPERATIONAL
XL1,ExtraLarge,OPERATIONAL
V9,Large,GROUNDED
";

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
}

fn table(csv: &str, name: &str) -> RawTable {
    parse_table(csv, name).unwrap()
}

fn scenario_a() -> RunTables {
    RunTables {
        routes: table(ROUTES, "route plan"),
        drivers: table(DRIVERS, "driver roster"),
        inventory: table(INVENTORY, "vehicle inventory"),
        details: None,
    }
}

fn acme_config(dir: &Path) -> Config {
    Config {
        provider_filter: Some("ACME".to_string()),
        ledger_dir: Some(dir.join("ledger")),
        store_dir: Some(dir.join("store")),
        ..Config::default()
    }
}

fn service(config: &Config) -> DispatchService {
    DispatchService::from_config(config).unwrap()
}

struct Fixture {
    dir: TempDir,
    inputs: RunInputs,
}

fn write_inputs(routes: &str, drivers: &str, inventory: &str) -> Fixture {
    let dir = tempdir().unwrap();
    let write = |name: &str, content: &str| -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    };
    let inputs = RunInputs {
        routes: write("routes.csv", routes),
        drivers: write("drivers.csv", drivers),
        inventory: write("inventory.csv", inventory),
        details: None,
    };
    Fixture { dir, inputs }
}

fn options(output: Option<PathBuf>) -> RunOptions {
    RunOptions {
        run_date: run_date(),
        dry_run: false,
        force_ledger: false,
        output,
        ledger_workbook: None,
    }
}

#[test]
fn test_scenario_a_shortage() {
    let config = acme_config(Path::new("unused"));
    let mut ledger = MemoryLedger::new();
    let outcome = service(&config)
        .run(&scenario_a(), run_date(), &mut ledger, false)
        .unwrap();

    assert_eq!(outcome.assignments.len(), 2);
    assert_eq!(outcome.unmatched.len(), 1);
    assert_eq!(outcome.unmatched[0].route.route_code, "CX3");
    assert_eq!(outcome.unmatched[0].reason, UnmatchedReason::ResourceShortage);

    assert_eq!(outcome.unassigned.len(), 1);
    assert_eq!(outcome.unassigned[0].resource_id, "XL1");

    // CX9 belongs to another provider
    assert_eq!(outcome.summary.dropped_routes, 1);
    assert_eq!(outcome.summary.total_routes, 3);
    assert_eq!(ledger.len(), 2);
}

#[test]
fn test_scenario_c_rerun_appends_nothing() {
    let config = acme_config(Path::new("unused"));
    let service = service(&config);
    let mut ledger = MemoryLedger::new();

    service.run(&scenario_a(), run_date(), &mut ledger, false).unwrap();
    let snapshot = ledger.rows().to_vec();

    let second = service.run(&scenario_a(), run_date(), &mut ledger, false).unwrap();
    let append = second.append.unwrap();
    assert_eq!(append.appended, 0);
    assert_eq!(append.skipped_duplicates, 2);
    assert_eq!(ledger.rows(), snapshot.as_slice());
}

#[test]
fn test_scenario_d_unknown_service_type() {
    let routes = "\
Route Code,Service Type,DSP
CX1,Standard Parcel,ACME
CX2,Hovercraft Delivery,ACME
";
    let mut tables = scenario_a();
    tables.routes = table(routes, "route plan");

    let config = acme_config(Path::new("unused"));
    let outcome = service(&config)
        .plan(&tables, run_date(), &[])
        .unwrap();

    assert_eq!(outcome.assignments.len(), 1);
    assert_eq!(outcome.unmatched.len(), 1);
    assert_eq!(outcome.unmatched[0].reason, UnmatchedReason::CategoryUnresolved);
    assert_eq!(outcome.summary.total_routes, 2);
    assert!((outcome.summary.allocation_rate - 0.5).abs() < 1e-9);
}

#[test]
fn test_scenario_b_duplicate_vehicle_reported_once() {
    let date = run_date();
    let make = |route: &str, driver: &str| Assignment {
        run_date: date,
        route_code: route.to_string(),
        service_type: "Standard Parcel".to_string(),
        category: "Large".to_string(),
        resource_id: "V1".to_string(),
        driver_name: driver.to_string(),
        wave: String::new(),
        staging_location: String::new(),
        provider: "ACME".to_string(),
        logical_id: logical_id(date, route, driver, "V1"),
    };
    let assignments = vec![make("CX1", "Sato"), make("CX2", "Suzuki")];

    let report = DuplicateValidator::default().validate(&assignments);
    assert_eq!(report.len(), 1);
    assert_eq!(report.groups[0].size(), 2);
    assert!(!report.is_blocking());
}

#[test]
fn test_duplicate_inventory_row_consumed_once() {
    let inventory = "\
Vehicle,Category,Status
V1,Large,OPERATIONAL
V1,Large,OPERATIONAL
";
    let mut tables = scenario_a();
    tables.inventory = table(inventory, "vehicle inventory");

    let config = acme_config(Path::new("unused"));
    let outcome = service(&config).plan(&tables, run_date(), &[]).unwrap();
    assert_eq!(outcome.assignments.len(), 1);
    assert_eq!(outcome.summary.conflict_count, 0);
    assert!(outcome
        .summary
        .issues
        .iter()
        .any(|i| i.label() == "DuplicateResourceRow" && i.subject() == "V1"));
}

#[test]
fn test_conservation_and_no_cross_assignment() {
    for max in 1..=3 {
        let config = Config {
            max_assignments_per_vehicle: max,
            ..acme_config(Path::new("unused"))
        };
        let outcome = service(&config).plan(&scenario_a(), run_date(), &[]).unwrap();

        assert_eq!(
            outcome.assignments.len() + outcome.unmatched.len(),
            outcome.summary.total_routes
        );

        let mut per_vehicle: HashMap<&str, usize> = HashMap::new();
        for a in &outcome.assignments {
            *per_vehicle.entry(a.resource_id.as_str()).or_default() += 1;
        }
        assert!(per_vehicle.values().all(|&n| n <= max));
        assert_eq!(outcome.summary.conflict_count, 0);
    }
}

#[test]
fn test_set_complement() {
    let config = acme_config(Path::new("unused"));
    let outcome = service(&config).plan(&scenario_a(), run_date(), &[]).unwrap();
    assert_eq!(
        outcome.assignments.len() + outcome.unassigned.len(),
        outcome.summary.operational_total
    );
}

#[test]
fn test_missing_driver_gets_placeholder() {
    let drivers = "\
Route,Driver
CX1,Sato
";
    let mut tables = scenario_a();
    tables.drivers = table(drivers, "driver roster");

    let config = acme_config(Path::new("unused"));
    let outcome = service(&config).plan(&tables, run_date(), &[]).unwrap();
    let cx2 = outcome
        .assignments
        .iter()
        .find(|a| a.route_code == "CX2")
        .unwrap();
    assert_eq!(cx2.driver_name, UNASSIGNED_DRIVER);
    assert_eq!(outcome.summary.missing_driver, 1);
}

#[test]
fn test_strict_mode_without_conflicts_appends() {
    let config = Config {
        conflict_mode: ConflictMode::Strict,
        ..acme_config(Path::new("unused"))
    };
    let service = service(&config);
    let mut ledger = MemoryLedger::new();

    let outcome = service.run(&scenario_a(), run_date(), &mut ledger, false).unwrap();
    assert_eq!(outcome.summary.status, RunStatus::Completed);
    assert_eq!(ledger.len(), 2);
}

#[test]
fn test_days_since_last_assignment() {
    let config = acme_config(Path::new("unused"));
    let service = service(&config);
    let mut ledger = MemoryLedger::new();

    // XL1 used three days earlier
    let earlier = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
    let routes = "\
Route Code,Service Type,DSP
CX7,Standard Parcel - Extra Large Van,ACME
";
    let mut first = scenario_a();
    first.routes = table(routes, "route plan");
    service.run(&first, earlier, &mut ledger, false).unwrap();

    let outcome = service.run(&scenario_a(), run_date(), &mut ledger, false).unwrap();
    let xl1 = &outcome.unassigned[0];
    assert_eq!(xl1.resource_id, "XL1");
    assert_eq!(xl1.last_seen.to_string(), "3");
}

#[test]
fn test_grouping_matches_full_rebuild() {
    let config = acme_config(Path::new("unused"));
    let service = service(&config);
    let mut ledger = MemoryLedger::new();

    for day in [6, 6, 7, 9] {
        let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        service.run(&scenario_a(), date, &mut ledger, false).unwrap();
    }

    let dates: Vec<NaiveDate> = ledger.rows().iter().map(|r| r.run_date).collect();
    assert_eq!(ledger.layout(), &group_full(&dates));
    assert_eq!(ledger.layout().section_starts(), vec![0, 2, 4]);
}

#[test]
fn test_execute_run_with_files() {
    let fixture = write_inputs(ROUTES, DRIVERS, INVENTORY);
    let config = acme_config(fixture.dir.path());
    let output = fixture.dir.path().join("result.xlsx");

    let outcome = execute_run(&config, &fixture.inputs, &options(Some(output.clone()))).unwrap();
    assert_eq!(outcome.append.as_ref().unwrap().appended, 2);
    assert!(output.exists());

    let run_id = outcome.run_id.unwrap();
    let history = open_history_store(&config).unwrap();
    let record = history.get(&run_id).unwrap();
    assert_eq!(record.inputs.len(), 3);
    assert_eq!(record.summary.matched, 2);

    // Rerun: idempotent against the file ledger
    let again = execute_run(&config, &fixture.inputs, &options(None)).unwrap();
    assert_eq!(again.append.unwrap().appended, 0);
    assert_eq!(open_ledger_read_only(&config).unwrap().len(), 2);
}

#[test]
fn test_dry_run_leaves_ledger_and_history_alone() {
    let fixture = write_inputs(ROUTES, DRIVERS, INVENTORY);
    let config = acme_config(fixture.dir.path());
    let opts = RunOptions {
        dry_run: true,
        ..options(None)
    };

    let outcome = execute_run(&config, &fixture.inputs, &opts).unwrap();
    assert_eq!(outcome.assignments.len(), 2);
    assert!(outcome.append.is_none());
    assert!(outcome.run_id.is_none());
    assert!(open_ledger_read_only(&config).unwrap().is_empty());
    assert!(open_history_store(&config).unwrap().is_empty());
}

#[test]
fn test_missing_column_aborts_before_ledger() {
    let inventory = "\
Vehicle,Category
V1,Large
";
    let fixture = write_inputs(ROUTES, DRIVERS, inventory);
    let config = acme_config(fixture.dir.path());

    let err = execute_run(&config, &fixture.inputs, &options(None)).unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
    assert!(open_ledger_read_only(&config).unwrap().is_empty());
}

#[test]
fn test_locked_ledger_is_a_write_conflict() {
    let fixture = write_inputs(ROUTES, DRIVERS, INVENTORY);
    let config = acme_config(fixture.dir.path());

    let _holder = FileLedgerStore::open(config.ledger_dir().unwrap()).unwrap();
    let err = execute_run(&config, &fixture.inputs, &options(None)).unwrap_err();
    assert!(matches!(err, Error::LedgerWriteConflict(_)));
}

#[test]
fn test_unwritable_result_workbook_leaves_ledger_untouched() {
    let fixture = write_inputs(ROUTES, DRIVERS, INVENTORY);
    let config = acme_config(fixture.dir.path());
    let output = fixture.dir.path().join("no/such/dir/result.xlsx");

    assert!(execute_run(&config, &fixture.inputs, &options(Some(output))).is_err());
    assert!(open_ledger_read_only(&config).unwrap().is_empty());
    assert!(open_history_store(&config).unwrap().is_empty());

    // the lock was released, so a corrected run goes through
    let outcome = execute_run(&config, &fixture.inputs, &options(None)).unwrap();
    assert_eq!(outcome.append.unwrap().appended, 2);
}

#[test]
fn test_failed_ledger_workbook_still_records_run() {
    let fixture = write_inputs(ROUTES, DRIVERS, INVENTORY);
    let config = acme_config(fixture.dir.path());
    let opts = RunOptions {
        ledger_workbook: Some(fixture.dir.path().join("no/such/dir/ledger.xlsx")),
        ..options(None)
    };

    assert!(execute_run(&config, &fixture.inputs, &opts).is_err());
    assert_eq!(open_ledger_read_only(&config).unwrap().len(), 2);
    let history = open_history_store(&config).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history.recent(1)[0].append.as_ref().unwrap().appended, 2);
}

#[test]
fn test_run_recovers_lock_left_by_crashed_run() {
    let fixture = write_inputs(ROUTES, DRIVERS, INVENTORY);
    let config = acme_config(fixture.dir.path());
    let ledger_dir = config.ledger_dir().unwrap();
    std::fs::create_dir_all(&ledger_dir).unwrap();
    std::fs::write(ledger_dir.join(LOCK_FILE), "999999\n").unwrap();

    let outcome = execute_run(&config, &fixture.inputs, &options(None)).unwrap();
    assert_eq!(outcome.append.unwrap().appended, 2);
    assert!(!ledger_dir.join(LOCK_FILE).exists());
}
