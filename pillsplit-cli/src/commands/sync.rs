use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use pillsplit_core::{CalendarDirSink, PillConfig};

use super::{open_manager, print_json};
use crate::render::Render;

pub fn run(config: &PillConfig, today: NaiveDate, json: bool) -> Result<()> {
    let manager = open_manager(config)?;
    let sink = CalendarDirSink::from_config(config)?;

    let report = manager.sync_reminders(&sink, today)?;

    if json {
        return print_json(&report);
    }

    println!("{} {}", "Reminders in".bold(), config.reminder_dir()?.display());
    println!("{}", report.render());
    Ok(())
}
