//! Excel export: per-run result workbook and the bordered ledger workbook

use std::path::Path;

use haisha_domain::model::LedgerRow;
use haisha_domain::service::{Boundary, SectionLayout};
use haisha_types::{Error, Result};
use rust_xlsxwriter::{Format, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::app::RunOutcome;

fn excel_err(e: XlsxError) -> Error {
    Error::Excel(e.to_string())
}

const LEDGER_HEADERS: [&str; 16] = [
    "Date",
    "Week",
    "Route",
    "Service Type",
    "Category",
    "Vehicle",
    "Driver",
    "Wave",
    "Staging",
    "Provider",
    "Departure",
    "Return",
    "Odometer Start",
    "Odometer End",
    "Remarks",
    "Logical ID",
];

/// Export the results of one run
pub fn export_run_results(outcome: &RunOutcome, output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    write_summary_sheet(workbook.add_worksheet(), outcome)?;
    write_assignments_sheet(workbook.add_worksheet(), outcome)?;
    write_unmatched_sheet(workbook.add_worksheet(), outcome)?;
    write_unassigned_sheet(workbook.add_worksheet(), outcome)?;
    write_conflicts_sheet(workbook.add_worksheet(), outcome)?;

    workbook.save(output_path).map_err(excel_err)?;
    Ok(())
}

/// Export the full ledger with date-section borders.
///
/// The first row of every date section gets a medium top border, the other
/// rows a thin one. Rows without a stored boundary are written unbordered.
pub fn export_ledger(rows: &[LedgerRow], layout: &SectionLayout, output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Ledger").map_err(excel_err)?;

    write_header_row(sheet, &LEDGER_HEADERS)?;
    sheet.set_freeze_panes(1, 0).map_err(excel_err)?;

    let section = Format::new().set_border_top(FormatBorder::Medium);
    let row_border = Format::new().set_border_top(FormatBorder::Thin);
    let plain = Format::new();

    for (idx, ledger_row) in rows.iter().enumerate() {
        let format = match layout.get(idx) {
            Some(Boundary::Section) => &section,
            Some(Boundary::Row) => &row_border,
            None => &plain,
        };
        write_ledger_row(sheet, (idx + 1) as u32, ledger_row, format)?;
    }

    let widths = [12, 6, 10, 30, 12, 14, 20, 10, 10, 10, 10, 10, 14, 14, 30, 48];
    for (col, width) in widths.iter().enumerate() {
        sheet.set_column_width(col as u16, *width).map_err(excel_err)?;
    }

    workbook.save(output_path).map_err(excel_err)?;
    Ok(())
}

fn write_ledger_row(sheet: &mut Worksheet, row: u32, r: &LedgerRow, format: &Format) -> Result<()> {
    let ext = &r.external;
    let cells: [&str; 16] = [
        &r.run_date.format("%Y-%m-%d").to_string(),
        &r.week_number.to_string(),
        &r.route_code,
        &r.service_type,
        &r.category,
        &r.resource_id,
        &r.driver_name,
        &r.wave,
        &r.staging_location,
        &r.provider,
        ext.departure_time.as_deref().unwrap_or(""),
        ext.return_time.as_deref().unwrap_or(""),
        ext.odometer_start.as_deref().unwrap_or(""),
        ext.odometer_end.as_deref().unwrap_or(""),
        ext.remarks.as_deref().unwrap_or(""),
        &r.logical_id,
    ];
    for (col, value) in cells.iter().enumerate() {
        sheet
            .write_string_with_format(row, col as u16, *value, format)
            .map_err(excel_err)?;
    }
    Ok(())
}

fn write_header_row(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    let header_format = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(excel_err)?;
    }
    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, outcome: &RunOutcome) -> Result<()> {
    sheet.set_name("Summary").map_err(excel_err)?;
    let header_format = Format::new().set_bold();
    let s = &outcome.summary;

    sheet
        .write_string_with_format(0, 0, "Vehicle Allocation Report", &header_format)
        .map_err(excel_err)?;

    let text_rows = [
        ("Run Date:", s.run_date.format("%Y-%m-%d").to_string()),
        ("Status:", s.status.label().to_string()),
        ("Conflict Severity:", s.conflicts.severity.label().to_string()),
    ];
    let mut row = 2;
    for (label, value) in &text_rows {
        sheet.write_string(row, 0, *label).map_err(excel_err)?;
        sheet.write_string(row, 1, value).map_err(excel_err)?;
        row += 1;
    }

    let number_rows = [
        ("Total Routes:", s.total_routes as f64),
        ("Matched:", s.matched as f64),
        ("Unmatched:", s.unmatched as f64),
        ("  Vehicle Shortage:", s.unmatched_shortage as f64),
        ("  Category Unresolved:", s.unmatched_category as f64),
        ("Missing Driver:", s.missing_driver as f64),
        ("Dropped (provider):", s.dropped_routes as f64),
        ("Inventory:", s.inventory_total as f64),
        ("Operational:", s.operational_total as f64),
        ("Unassigned:", s.unassigned as f64),
        ("Conflicts:", s.conflict_count as f64),
    ];
    for (label, value) in &number_rows {
        sheet.write_string(row, 0, *label).map_err(excel_err)?;
        sheet.write_number(row, 1, *value).map_err(excel_err)?;
        row += 1;
    }

    let percent = Format::new().set_num_format("0.0%");
    sheet.write_string(row, 0, "Allocation Rate:").map_err(excel_err)?;
    sheet
        .write_number_with_format(row, 1, s.allocation_rate, &percent)
        .map_err(excel_err)?;

    if !s.issues.is_empty() {
        row += 2;
        sheet
            .write_string_with_format(row, 0, "Issues", &header_format)
            .map_err(excel_err)?;
        for issue in &s.issues {
            row += 1;
            sheet.write_string(row, 0, issue.label()).map_err(excel_err)?;
            sheet.write_string(row, 1, issue.to_string()).map_err(excel_err)?;
        }
    }

    sheet.set_column_width(0, 24).map_err(excel_err)?;
    sheet.set_column_width(1, 60).map_err(excel_err)?;
    Ok(())
}

fn write_assignments_sheet(sheet: &mut Worksheet, outcome: &RunOutcome) -> Result<()> {
    sheet.set_name("Assignments").map_err(excel_err)?;
    write_header_row(
        sheet,
        &[
            "Route", "Service Type", "Category", "Vehicle", "Driver", "Wave", "Staging", "Provider",
            "Logical ID",
        ],
    )?;

    for (idx, a) in outcome.assignments.iter().enumerate() {
        let row = (idx + 1) as u32;
        let cells: [&str; 9] = [
            &a.route_code,
            &a.service_type,
            &a.category,
            &a.resource_id,
            &a.driver_name,
            &a.wave,
            &a.staging_location,
            &a.provider,
            &a.logical_id,
        ];
        for (col, value) in cells.iter().enumerate() {
            sheet.write_string(row, col as u16, *value).map_err(excel_err)?;
        }
    }

    sheet.set_freeze_panes(1, 0).map_err(excel_err)?;
    sheet.set_column_width(1, 30).map_err(excel_err)?;
    sheet.set_column_width(8, 48).map_err(excel_err)?;
    Ok(())
}

fn write_unmatched_sheet(sheet: &mut Worksheet, outcome: &RunOutcome) -> Result<()> {
    sheet.set_name("Unmatched").map_err(excel_err)?;
    write_header_row(sheet, &["Route", "Service Type", "Category", "Reason"])?;

    for (idx, u) in outcome.unmatched.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, &u.route.route_code).map_err(excel_err)?;
        sheet.write_string(row, 1, &u.route.service_type).map_err(excel_err)?;
        sheet
            .write_string(row, 2, u.route.required_category.as_deref().unwrap_or("-"))
            .map_err(excel_err)?;
        sheet.write_string(row, 3, u.reason.label()).map_err(excel_err)?;
    }

    sheet.set_column_width(1, 30).map_err(excel_err)?;
    sheet.set_column_width(3, 24).map_err(excel_err)?;
    Ok(())
}

fn write_unassigned_sheet(sheet: &mut Worksheet, outcome: &RunOutcome) -> Result<()> {
    sheet.set_name("Unassigned").map_err(excel_err)?;
    write_header_row(
        sheet,
        &[
            "Vehicle",
            "Category",
            "Identification",
            "Tracking Device",
            "Ownership",
            "Days Since Last Use",
        ],
    )?;

    for (idx, item) in outcome.unassigned.iter().enumerate() {
        let row = (idx + 1) as u32;
        let d = &item.details;
        sheet.write_string(row, 0, &item.resource_id).map_err(excel_err)?;
        sheet.write_string(row, 1, &item.category).map_err(excel_err)?;
        sheet
            .write_string(row, 2, d.identification_code.as_deref().unwrap_or(""))
            .map_err(excel_err)?;
        sheet
            .write_string(row, 3, d.tracking_device_code.as_deref().unwrap_or(""))
            .map_err(excel_err)?;
        sheet
            .write_string(row, 4, d.ownership.as_deref().unwrap_or(""))
            .map_err(excel_err)?;
        sheet
            .write_string(row, 5, item.last_seen.to_string())
            .map_err(excel_err)?;
    }

    sheet.set_column_width(0, 14).map_err(excel_err)?;
    sheet.set_column_width(5, 20).map_err(excel_err)?;
    Ok(())
}

fn write_conflicts_sheet(sheet: &mut Worksheet, outcome: &RunOutcome) -> Result<()> {
    sheet.set_name("Conflicts").map_err(excel_err)?;
    write_header_row(sheet, &["Vehicle", "Severity", "Route", "Driver"])?;

    let report = &outcome.summary.conflicts;
    let mut row = 1;
    for group in &report.groups {
        for entry in &group.entries {
            sheet.write_string(row, 0, &group.resource_id).map_err(excel_err)?;
            sheet
                .write_string(row, 1, report.severity.label())
                .map_err(excel_err)?;
            sheet.write_string(row, 2, &entry.route_code).map_err(excel_err)?;
            sheet.write_string(row, 3, &entry.driver_name).map_err(excel_err)?;
            row += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use haisha_domain::model::{logical_id, iso_week, ExternalFields};
    use haisha_domain::service::group_full;
    use tempfile::tempdir;

    fn row(day: u32, route: &str) -> LedgerRow {
        let run_date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        LedgerRow {
            run_date,
            week_number: iso_week(run_date),
            route_code: route.to_string(),
            service_type: "Standard Parcel".to_string(),
            category: "Large".to_string(),
            resource_id: format!("V-{}", route),
            driver_name: "Sato".to_string(),
            wave: String::new(),
            staging_location: String::new(),
            provider: "ACME".to_string(),
            logical_id: logical_id(run_date, route, "Sato", &format!("V-{}", route)),
            external: ExternalFields::default(),
        }
    }

    #[test]
    fn test_export_ledger_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");
        let rows = vec![row(6, "CX1"), row(6, "CX2"), row(7, "CX1")];
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.run_date).collect();
        export_ledger(&rows, &group_full(&dates), &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
