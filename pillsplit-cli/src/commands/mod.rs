pub mod config;
pub mod days;
pub mod fill;
pub mod give;
pub mod history;
pub mod status;
pub mod sync;

use anyhow::{Context, Result};
use pillsplit_core::{CalendarDirSource, PillConfig, PillManager, SqliteLedger};
use serde::Serialize;
use tracing::debug;

/// Default length of `days` when only `--from` is given
pub const DEFAULT_DAYS_SPAN: i64 = 14;

pub type Manager = PillManager<SqliteLedger, CalendarDirSource>;

pub fn open_manager(config: &PillConfig) -> Result<Manager> {
    debug!(
        ledger = %config.database_path.display(),
        custody = %config.custody_dir.display(),
        "opening ledger and custody calendar"
    );
    PillManager::from_config(config).context("Failed to open the ledger or custody calendar")
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
