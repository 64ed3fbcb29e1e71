//! Roster command-line entry point.
//!
//! # Responsibility
//! - Parse arguments (store path, optional file logging).
//! - Load the roster once and hand it to the interactive menu.

use anyhow::Context;
use clap::Parser;
use roster_core::{
    default_log_level, init_logging, CsvRecordStore, RecordService, DEFAULT_DATA_FILE,
};
use std::io;
use std::path::PathBuf;

mod menu;

use menu::Menu;

#[derive(Parser)]
#[command(name = "roster", version = roster_core::core_version())]
#[command(about = "Manage an employee roster stored in a CSV file", long_about = None)]
struct Cli {
    /// CSV file holding the roster. Created on first save.
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    data_file: PathBuf,

    /// Directory for rotating log files. Logging is off when omitted.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error. Defaults by build mode.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    let store = CsvRecordStore::new(&cli.data_file);
    let service = RecordService::open(store)
        .with_context(|| format!("failed to load roster from `{}`", cli.data_file.display()))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(service, stdin.lock(), stdout.lock()).run()?;
    Ok(())
}
