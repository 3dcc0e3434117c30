use anyhow::{Result, bail};
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use pillsplit_core::date_window::parse_date;
use pillsplit_core::{Distribution, LedgerStore, NewDistribution, NextDistribution, PillConfig, PillError};
use serde_json::json;

use super::{Manager, open_manager, print_json};
use crate::render::Render;

pub struct GiveArgs {
    pub quantity: Option<u32>,
    pub date: Option<String>,
    pub fill: Option<i64>,
    pub notes: Option<String>,
    pub edit: Option<i64>,
}

pub fn run(config: &PillConfig, args: GiveArgs, today: NaiveDate, json: bool) -> Result<()> {
    let manager = open_manager(config)?;

    let date = match &args.date {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };

    let (verb, distribution) = match args.edit {
        Some(id) => ("Updated", edit(&manager, id, &args, date)?),
        None => ("Recorded", add(&manager, &args, date.unwrap_or(today), today)?),
    };

    // Already saved: a custody calendar problem only costs the run-out date
    let run_out = manager.run_out(distribution.date, distribution.quantity);

    if json {
        let (run_out, run_out_error) = match &run_out {
            Ok(run_out) => (Some(run_out), None),
            Err(e) => (None, Some(e.to_string())),
        };
        return print_json(&json!({
            "distribution": distribution,
            "run_out": run_out,
            "run_out_error": run_out_error,
        }));
    }

    println!("{} {}", format!("{verb} distribution").green(), distribution.render());
    match run_out {
        Ok(run_out) => println!("   {}", run_out.render()),
        Err(e) => eprintln!("   {} {}", "Run-out date unavailable:".yellow(), e),
    }
    Ok(())
}

fn add(
    manager: &Manager,
    args: &GiveArgs,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<Distribution> {
    let ledger = manager.ledger();

    let fill_id = match args.fill {
        Some(id) => Some(id),
        None => ledger.latest_fill()?.map(|f| f.id),
    };

    let (quantity, suggested_notes) = match args.quantity {
        Some(quantity) => (quantity, None),
        None => match manager.overview(today)?.next {
            NextDistribution::Planned(planned) => {
                (planned.plan.pills_to_give, Some(planned.suggested_notes()))
            }
            NextDistribution::Unavailable { reason } => {
                bail!("No planned quantity (custody calendar unavailable: {reason}); pass a quantity")
            }
            NextDistribution::NoData | NextDistribution::AwaitingFirstDistribution => {
                bail!("No planned quantity yet; pass a quantity")
            }
        },
    };

    let distribution = NewDistribution {
        date,
        quantity,
        fill_id,
        notes: args.notes.clone().or(suggested_notes),
    };
    Ok(ledger.add_distribution(&distribution)?)
}

fn edit(
    manager: &Manager,
    id: i64,
    args: &GiveArgs,
    date: Option<NaiveDate>,
) -> Result<Distribution> {
    let ledger = manager.ledger();
    let existing = ledger
        .get_distribution(id)?
        .ok_or(PillError::NotFound { kind: "distribution", id })?;

    let updated = NewDistribution {
        date: date.unwrap_or(existing.date),
        quantity: args.quantity.unwrap_or(existing.quantity),
        fill_id: args.fill.or(existing.fill_id),
        notes: args.notes.clone().or(existing.notes),
    };
    Ok(ledger.update_distribution(id, &updated)?)
}
