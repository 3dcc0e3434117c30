use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use pillsplit_core::date_window::parse_date;
use pillsplit_core::{LedgerStore, NewFill, PillConfig, PillError};

use super::{open_manager, print_json};
use crate::FillAction;
use crate::render::Render;

pub fn run(config: &PillConfig, action: FillAction, today: NaiveDate, json: bool) -> Result<()> {
    let manager = open_manager(config)?;
    let ledger = manager.ledger();

    let (verb, fill) = match action {
        FillAction::Add {
            quantity,
            date,
            pharmacy,
            rx,
            notes,
        } => {
            let date = match date {
                Some(s) => parse_date(&s)?,
                None => today,
            };
            let new_fill = NewFill {
                date,
                quantity,
                prescription_number: rx,
                pharmacy,
                notes,
            };
            ("Recorded", ledger.add_fill(&new_fill)?)
        }
        FillAction::Edit {
            id,
            date,
            quantity,
            pharmacy,
            rx,
            notes,
        } => {
            let existing = ledger
                .get_fill(id)?
                .ok_or(PillError::NotFound { kind: "fill", id })?;

            let updated = NewFill {
                date: match date {
                    Some(s) => parse_date(&s)?,
                    None => existing.date,
                },
                quantity: quantity.unwrap_or(existing.quantity),
                prescription_number: rx.or(existing.prescription_number),
                pharmacy: pharmacy.or(existing.pharmacy),
                notes: notes.or(existing.notes),
            };
            ("Updated", ledger.update_fill(id, &updated)?)
        }
    };

    if json {
        return print_json(&fill);
    }

    println!("{} {}", format!("{verb} fill").green(), fill.render());

    let refill = manager.planner().refill_eligible_date(fill.date, fill.quantity);
    println!("   {}", format!("Refill eligible on {refill}").dimmed());
    Ok(())
}
