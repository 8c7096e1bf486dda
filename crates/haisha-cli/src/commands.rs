//! Command handlers

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use haisha_app::app::{
    execute_run, export_ledger_workbook, ledger_stats, recent_runs, regroup_ledger, RunInputs,
    RunOptions,
};
use haisha_app::config::Config;
use haisha_domain::service::RunStatus;
use haisha_types::{ConflictMode, Error, GroupingMode, OutputFormat, Result};
use tracing::info;

use crate::cli::{Cli, Commands, LedgerAction};
use crate::output::{output_history, output_ledger_stats, output_run};

pub fn execute(cli: Cli) -> Result<()> {
    // Load config
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref dir) = cli.ledger_dir {
        config.ledger_dir = Some(dir.clone());
    }
    let output_format = cli.format.unwrap_or(config.output_format);

    match cli.command {
        Commands::Run {
            routes,
            drivers,
            inventory,
            details,
            date,
            output,
            ledger_workbook,
            provider,
            strict,
            force_ledger,
            full_regroup,
            dry_run,
        } => {
            if let Some(provider) = provider {
                config.provider_filter = Some(provider);
            }
            if strict {
                config.conflict_mode = ConflictMode::Strict;
            }
            if full_regroup {
                config.grouping_mode = GroupingMode::Full;
            }
            let inputs = RunInputs {
                routes,
                drivers,
                inventory,
                details,
            };
            let options = RunOptions {
                run_date: date.unwrap_or_else(today),
                dry_run,
                force_ledger,
                output,
                ledger_workbook,
            };
            cmd_run(&config, &inputs, &options, output_format)
        }

        Commands::Ledger { action } => match action {
            LedgerAction::Export { output } => cmd_ledger_export(&config, output),
            LedgerAction::Regroup => cmd_ledger_regroup(&config),
            LedgerAction::Stats => output_ledger_stats(output_format, &ledger_stats(&config)?),
        },

        Commands::History { limit } => output_history(output_format, &recent_runs(&config, limit)?),

        Commands::Config {
            show,
            set_provider,
            set_operational_value,
            set_conflict_mode,
            set_max_per_vehicle,
            set_category_mapping,
            set_ledger_dir,
            set_grouping,
            set_output,
            reset,
        } => cmd_config(
            show,
            set_provider,
            set_operational_value,
            set_conflict_mode,
            set_max_per_vehicle,
            set_category_mapping,
            set_ledger_dir,
            set_grouping,
            set_output,
            reset,
        ),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn cmd_run(
    config: &Config,
    inputs: &RunInputs,
    options: &RunOptions,
    output_format: OutputFormat,
) -> Result<()> {
    for path in [&inputs.routes, &inputs.drivers, &inputs.inventory]
        .into_iter()
        .chain(inputs.details.as_ref())
    {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
    }

    info!(run_date = %options.run_date, dry_run = options.dry_run, "starting allocation run");
    let outcome = execute_run(config, inputs, options)?;
    output_run(output_format, &outcome)?;

    if outcome.summary.status == RunStatus::Failed {
        let message = if outcome.append.is_some() {
            "vehicle conflicts in strict mode (ledger written with --force-ledger)"
        } else {
            "vehicle conflicts in strict mode; ledger not written"
        };
        return Err(Error::RunFailed(message.to_string()));
    }

    Ok(())
}

fn cmd_ledger_export(config: &Config, output: PathBuf) -> Result<()> {
    let rows = export_ledger_workbook(config, &output)?;
    println!("Exported {} ledger rows to: {}", rows, output.display());
    Ok(())
}

fn cmd_ledger_regroup(config: &Config) -> Result<()> {
    let sections = regroup_ledger(config)?;
    println!("Ledger regrouped: {} date sections", sections);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_config(
    show: bool,
    set_provider: Option<String>,
    set_operational_value: Option<String>,
    set_conflict_mode: Option<ConflictMode>,
    set_max_per_vehicle: Option<usize>,
    set_category_mapping: Option<PathBuf>,
    set_ledger_dir: Option<PathBuf>,
    set_grouping: Option<GroupingMode>,
    set_output: Option<OutputFormat>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(provider) = set_provider {
        config.provider_filter = if provider.trim().is_empty() {
            None
        } else {
            Some(provider)
        };
        modified = true;
    }

    if let Some(value) = set_operational_value {
        config.operational_value = value;
        modified = true;
    }

    if let Some(mode) = set_conflict_mode {
        config.conflict_mode = mode;
        modified = true;
    }

    if let Some(max) = set_max_per_vehicle {
        config.max_assignments_per_vehicle = max;
        modified = true;
    }

    if let Some(path) = set_category_mapping {
        config.category_mapping_path = Some(path);
        // Fail early on a broken mapping file
        config.category_mapping()?;
        modified = true;
    }

    if let Some(dir) = set_ledger_dir {
        config.ledger_dir = Some(dir);
        modified = true;
    }

    if let Some(grouping) = set_grouping {
        config.grouping_mode = grouping;
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}
