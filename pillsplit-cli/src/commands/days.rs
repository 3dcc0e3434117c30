use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use pillsplit_core::date_window::parse_date;
use pillsplit_core::{DateWindow, PillConfig};
use serde_json::json;

use super::{DEFAULT_DAYS_SPAN, open_manager, print_json};
use crate::render::{Render, format_date_label};

pub fn run(
    config: &PillConfig,
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let window = DateWindow::from_args(from, to, today, DEFAULT_DAYS_SPAN)?;
    let manager = open_manager(config)?;
    let days = manager.parent_days(window)?;

    if json {
        return print_json(&days.split());
    }

    println!(
        "{}",
        format!("Custody {} to {}", window.start(), window.end()).bold()
    );
    println!("{}", days.render());
    Ok(())
}

pub fn next_day(config: &PillConfig, after: Option<&str>, today: NaiveDate, json: bool) -> Result<()> {
    let after = match after {
        Some(s) => parse_date(s)?,
        None => today,
    };
    let manager = open_manager(config)?;
    let next = manager.next_other_parent_day(after)?;

    if json {
        return print_json(&json!({ "after": after, "next_other_parent_day": next }));
    }

    println!(
        "Next other-parent day after {}: {}",
        after,
        format_date_label(next, today).bold()
    );
    Ok(())
}
