//! Terminal rendering for pillsplit-core types.
//!
//! Extension traits that add colored output via owo_colors.

use chrono::NaiveDate;
use owo_colors::OwoColorize;
use pillsplit_core::custody::Parent;
use pillsplit_core::status::ActiveStatus;
use pillsplit_core::{
    Distribution, Fill, NextDistribution, Overview, ParentDays, PlannedDistribution, ReminderReport,
    RunOut, Status,
};

pub trait Render {
    fn render(&self) -> String;
}

/// "Today", "Tomorrow", "Yesterday", or e.g. "Thu Nov 13"
pub fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// "in 3 days", "2 days ago", "today"
fn relative_days(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        d if d > 0 => format!("in {} {}", d, pluralize("day", d)),
        d => format!("{} {} ago", -d, pluralize("day", -d)),
    }
}

pub fn pluralize(word: &str, count: i64) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

impl Render for Overview {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        match &self.status {
            Status::NoData { reason } => {
                lines.push(reason.dimmed().to_string());
                lines.push(format!(
                    "{}",
                    "Record one with: pillsplit fill add <quantity>".dimmed()
                ));
                return lines.join("\n");
            }
            Status::Active(active) => lines.extend(render_active(active, self.today)),
        }

        if let Some(run_out) = &self.run_out {
            lines.push(String::new());
            lines.push(run_out.render());
        }

        lines.push(String::new());
        lines.push(format!("{}", "Next handoff".bold()));
        match &self.next {
            NextDistribution::NoData => {}
            NextDistribution::AwaitingFirstDistribution => {
                lines.push(format!(
                    "   {}",
                    "No distribution recorded yet. Record one with: pillsplit give <quantity>".dimmed()
                ));
            }
            NextDistribution::Planned(planned) => {
                lines.extend(render_planned(planned, self.today));
            }
            NextDistribution::Unavailable { reason } => {
                lines.push(format!("   {} {}", "Custody calendar unavailable:".red(), reason));
            }
        }

        lines.join("\n")
    }
}

fn render_active(active: &ActiveStatus, today: NaiveDate) -> Vec<String> {
    let mut lines = vec![format!("{}", "Current fill".bold())];

    let fill = &active.fill;
    let mut fill_line = format!(
        "   {} pills on {} ({})",
        fill.quantity,
        format_date_label(fill.date, today),
        relative_days(-fill.days_ago).dimmed()
    );
    if let Some(pharmacy) = &fill.pharmacy {
        fill_line.push_str(&format!(" at {pharmacy}"));
    }
    lines.push(fill_line);

    let remaining = active.pills_with_tracked_parent;
    let remaining_line = format!(
        "   {} given to the other parent, {} left",
        active.total_distributed, remaining
    );
    if remaining < 0 {
        lines.push(remaining_line.red().to_string());
    } else {
        lines.push(remaining_line);
    }

    let refill = &active.refill;
    if refill.can_refill {
        lines.push(format!(
            "   {} since {}",
            "Refill available".green(),
            format_date_label(refill.eligible_date, today)
        ));
    } else {
        lines.push(format!(
            "   Refill on {} {}",
            format_date_label(refill.eligible_date, today),
            format!("({})", relative_days(refill.days_until)).dimmed()
        ));
    }

    if let Some(dist) = &active.distribution {
        lines.push(String::new());
        lines.push(format!("{}", "Last handoff".bold()));
        lines.push(format!(
            "   {} pills on {} ({})",
            dist.quantity,
            format_date_label(dist.date, today),
            relative_days(-dist.days_ago).dimmed()
        ));
    }

    lines
}

impl Render for RunOut {
    fn render(&self) -> String {
        match self {
            RunOut::CustodyAware { date } => {
                format!("{} {}", "Other parent runs out:".bold(), date.format("%a %b %-d"))
            }
            RunOut::Approximate { date, reason } => format!(
                "{} {} {}",
                "Other parent runs out:".bold(),
                date.format("%a %b %-d"),
                format!("(approximate: {reason})").yellow()
            ),
        }
    }
}

fn render_planned(planned: &PlannedDistribution, today: NaiveDate) -> Vec<String> {
    let plan = &planned.plan;
    let mut lines = Vec::new();

    let when = format_date_label(plan.distribution_date, today);
    let headline = format!("   Give {} pills on {}", plan.pills_to_give, when);
    if plan.action_required {
        lines.push(headline.yellow().to_string());
    } else {
        lines.push(headline);
    }

    lines.push(format!(
        "   {}",
        format!(
            "Covers {} - {} ({} of {} days in the period)",
            planned.coverage_start.format("%b %-d"),
            planned.coverage_end.format("%b %-d"),
            planned.split.other_pills,
            planned.split.total_days
        )
        .dimmed()
    ));

    if plan.needs_refill_first {
        lines.push(format!(
            "   {} refill opens {} {} after the supply runs out",
            "Gap:".red(),
            format_date_label(plan.refill_eligible_date, today),
            format!("{} {}", plan.gap_days, pluralize("day", plan.gap_days))
        ));
    }

    for note in plan.notes.lines() {
        lines.push(format!("   {}", note.dimmed()));
    }

    lines
}

impl Render for ParentDays {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        for day in self.window.days() {
            let label = day.format("%a %b %-d").to_string();
            let line = match self.parent_on(day) {
                Some(Parent::Tracked) => format!("   {}  {}", label, "tracked parent".green()),
                Some(Parent::Other) => format!("   {}  {}", label, "other parent".cyan()),
                None => continue,
            };
            lines.push(line);
        }

        let split = self.split();
        lines.push(String::new());
        lines.push(format!(
            "   {} tracked, {} other, {} {}",
            split.tracked_pills,
            split.other_pills,
            split.total_days,
            pluralize("day", split.total_days)
        ));

        lines.join("\n")
    }
}

impl Render for Fill {
    fn render(&self) -> String {
        let mut line = format!(
            "{} {} {} pills",
            format!("#{}", self.id).dimmed(),
            self.date,
            self.quantity
        );
        if let Some(pharmacy) = &self.pharmacy {
            line.push_str(&format!(" at {pharmacy}"));
        }
        if let Some(rx) = &self.prescription_number {
            line.push_str(&format!(" {}", format!("Rx {rx}").dimmed()));
        }
        if let Some(notes) = &self.notes {
            line.push_str(&format!(" {}", notes.dimmed()));
        }
        line
    }
}

impl Render for Distribution {
    fn render(&self) -> String {
        let mut line = format!(
            "{} {} {} pills",
            format!("#{}", self.id).dimmed(),
            self.date,
            self.quantity
        );
        if let Some(fill_id) = self.fill_id {
            line.push_str(&format!(" {}", format!("from fill #{fill_id}").dimmed()));
        }
        if let Some(notes) = &self.notes {
            line.push_str(&format!(" {}", notes.dimmed()));
        }
        line
    }
}

impl Render for ReminderReport {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        for created in &self.created {
            lines.push(format!("   {} {} {}", "+".green(), created.title.green(), created.date.dimmed()));
        }
        for kind in &self.skipped {
            lines.push(format!("   {} {}", "=".dimmed(), format!("{kind} already exists").dimmed()));
        }
        for failed in &self.failed {
            lines.push(format!("   {} {} {}: {}", "!".red(), failed.kind, failed.date, failed.error.red()));
        }

        if lines.is_empty() {
            return "   Nothing to sync".dimmed().to_string();
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_date_label() {
        let today = date(2025, 11, 12);
        assert_eq!(format_date_label(today, today), "Today");
        assert_eq!(format_date_label(date(2025, 11, 13), today), "Tomorrow");
        assert_eq!(format_date_label(date(2025, 11, 11), today), "Yesterday");
        assert_eq!(format_date_label(date(2025, 11, 20), today), "Thu Nov 20");
    }

    #[test]
    fn test_relative_days() {
        assert_eq!(relative_days(0), "today");
        assert_eq!(relative_days(1), "in 1 day");
        assert_eq!(relative_days(-3), "3 days ago");
    }
}
