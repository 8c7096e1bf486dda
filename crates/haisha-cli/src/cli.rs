//! CLI definition using clap

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use haisha_types::{ConflictMode, GroupingMode, OutputFormat};

#[derive(Parser)]
#[command(name = "haisha")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Daily vehicle allocation for delivery routes with an append-only ledger")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Ledger directory override
    #[arg(long, global = true)]
    pub ledger_dir: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Allocate vehicles to today's routes and append the result to the ledger
    Run {
        /// Route plan CSV
        #[arg(long)]
        routes: PathBuf,

        /// Driver roster CSV
        #[arg(long)]
        drivers: PathBuf,

        /// Vehicle inventory CSV
        #[arg(long)]
        inventory: PathBuf,

        /// Optional vehicle details CSV (identification, tracking device, ownership)
        #[arg(long)]
        details: Option<PathBuf>,

        /// Run date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Result workbook (.xlsx)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Re-export the full ledger workbook after appending
        #[arg(long)]
        ledger_workbook: Option<PathBuf>,

        /// Only provider tag whose routes are allocated
        #[arg(long)]
        provider: Option<String>,

        /// Treat duplicate vehicle usage as blocking
        #[arg(long)]
        strict: bool,

        /// Append to the ledger even when strict mode blocks the run
        #[arg(long)]
        force_ledger: bool,

        /// Rebuild every date section after appending
        #[arg(long)]
        full_regroup: bool,

        /// Allocate and report without writing the ledger or history
        #[arg(long)]
        dry_run: bool,
    },

    /// Ledger maintenance
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },

    /// Show recent runs
    History {
        /// Number of runs to show
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },

    /// Configure settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set provider filter (empty string clears it)
        #[arg(long)]
        set_provider: Option<String>,

        /// Set the inventory status value that means operational
        #[arg(long)]
        set_operational_value: Option<String>,

        /// Set conflict mode
        #[arg(long)]
        set_conflict_mode: Option<ConflictMode>,

        /// Set maximum routes per vehicle
        #[arg(long)]
        set_max_per_vehicle: Option<usize>,

        /// Set category mapping TOML file
        #[arg(long)]
        set_category_mapping: Option<PathBuf>,

        /// Set ledger directory
        #[arg(long)]
        set_ledger_dir: Option<PathBuf>,

        /// Set grouping mode
        #[arg(long)]
        set_grouping: Option<GroupingMode>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum LedgerAction {
    /// Write the ledger to a workbook with date-section borders
    Export {
        /// Output workbook (.xlsx)
        output: PathBuf,
    },

    /// Recompute the date sections of the whole ledger
    Regroup,

    /// Show ledger statistics
    Stats,
}
