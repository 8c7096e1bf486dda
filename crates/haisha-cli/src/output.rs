//! Output formatting module

use haisha_app::app::{LedgerStats, RunOutcome};
use haisha_domain::service::generate_summary_report;
use haisha_store::RunRecord;
use haisha_types::{OutputFormat, Result};

pub fn output_run(output_format: OutputFormat, outcome: &RunOutcome) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    println!("{}", generate_summary_report(&outcome.summary));

    if !outcome.assignments.is_empty() {
        println!("\nAssignments");
        println!("===========");
        println!(
            "{:<10} {:<12} {:<14} {:<20} {:<8} {:<10}",
            "Route", "Category", "Vehicle", "Driver", "Wave", "Staging"
        );
        println!("{}", "-".repeat(78));
        for a in &outcome.assignments {
            println!(
                "{:<10} {:<12} {:<14} {:<20} {:<8} {:<10}",
                a.route_code, a.category, a.resource_id, a.driver_name, a.wave, a.staging_location
            );
        }
    }

    if !outcome.unmatched.is_empty() {
        println!("\nUnmatched Routes");
        println!("================");
        for u in &outcome.unmatched {
            println!(
                "{:<10} {:<36} {}",
                u.route.route_code,
                u.route.service_type,
                u.reason.label()
            );
        }
    }

    if !outcome.unassigned.is_empty() {
        println!("\nUnassigned Vehicles");
        println!("===================");
        println!("{:<14} {:<12} {:>16}", "Vehicle", "Category", "Days since use");
        for item in &outcome.unassigned {
            println!(
                "{:<14} {:<12} {:>16}",
                item.resource_id,
                item.category,
                item.last_seen.to_string()
            );
        }
    }

    println!();
    match outcome.append {
        Some(ref append) => println!(
            "Ledger: {} appended, {} already present, {} rows in {} date sections",
            append.appended, append.skipped_duplicates, append.total_rows, append.sections
        ),
        None => println!("Ledger: not written"),
    }
    if let Some(ref run_id) = outcome.run_id {
        println!("Run ID: {}", run_id);
    }

    Ok(())
}

pub fn output_ledger_stats(output_format: OutputFormat, stats: &LedgerStats) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    print!("{}", stats);
    if !stats.rows_per_date.is_empty() {
        println!();
        println!("{:<12} {:>6}", "Date", "Rows");
        for (date, count) in &stats.rows_per_date {
            println!("{:<12} {:>6}", date.to_string(), count);
        }
    }
    Ok(())
}

pub fn output_history(output_format: OutputFormat, records: &[RunRecord]) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    println!("Run History");
    println!("===========");

    if records.is_empty() {
        println!("No runs recorded.");
        return Ok(());
    }

    println!(
        "{:<36} {:<10} {:>7} {:>7} {:>9} {:>9}  {}",
        "Run ID", "Date", "Routes", "Matched", "Appended", "Conflicts", "Status"
    );
    println!("{}", "-".repeat(100));

    for record in records {
        let s = &record.summary;
        let appended = record
            .append
            .as_ref()
            .map(|a| a.appended.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<36} {:<10} {:>7} {:>7} {:>9} {:>9}  {}",
            record.run_id,
            s.run_date.to_string(),
            s.total_routes,
            s.matched,
            appended,
            s.conflict_count,
            s.status.label()
        );
    }

    Ok(())
}
