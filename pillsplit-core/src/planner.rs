//! Refill eligibility and distribution planning.
//!
//! Works on plain dates and counts produced by the custody scheduler; nothing
//! here reads the calendar or the ledger.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_REFILL_THRESHOLD_PERCENT;

/// When and how many pills to hand over next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionPlan {
    pub distribution_date: NaiveDate,
    pub pills_to_give: u32,
    pub other_parent_out_date: NaiveDate,
    pub refill_eligible_date: NaiveDate,
    pub needs_refill_first: bool,
    /// Days the other parent is without medication before the handoff
    pub gap_days: i64,
    pub action_required: bool,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionPlanner {
    refill_threshold_percent: u32,
}

impl Default for DistributionPlanner {
    fn default() -> Self {
        DistributionPlanner {
            refill_threshold_percent: DEFAULT_REFILL_THRESHOLD_PERCENT,
        }
    }
}

impl DistributionPlanner {
    pub fn new(refill_threshold_percent: u32) -> Self {
        DistributionPlanner {
            refill_threshold_percent,
        }
    }

    pub fn refill_threshold_percent(&self) -> u32 {
        self.refill_threshold_percent
    }

    /// First day a refill is allowed: `fill_date + floor(supply_days × threshold)`.
    pub fn refill_eligible_date(&self, fill_date: NaiveDate, supply_days: u32) -> NaiveDate {
        let elapsed = u64::from(supply_days) * u64::from(self.refill_threshold_percent) / 100;
        fill_date + Duration::days(elapsed as i64)
    }

    /// First day without a pill, assuming one pill a day from the handoff.
    pub fn other_parent_run_out_date(distribution_date: NaiveDate, quantity_given: u32) -> NaiveDate {
        distribution_date + Duration::days(i64::from(quantity_given))
    }

    /// Plan the next handoff.
    ///
    /// Pills go over the evening before the other parent's next pill day.
    pub fn plan_next_distribution(
        &self,
        other_parent_out_date: NaiveDate,
        refill_eligible_date: NaiveDate,
        next_other_custody_day: NaiveDate,
        pills_needed: u32,
        today: NaiveDate,
    ) -> DistributionPlan {
        let distribution_date = next_other_custody_day - Duration::days(1);
        let needs_refill_first = refill_eligible_date > other_parent_out_date;

        let gap_days = if needs_refill_first && distribution_date > refill_eligible_date {
            (distribution_date - other_parent_out_date).num_days()
        } else {
            0
        };

        let action_required = today >= other_parent_out_date;

        let notes = plan_notes(
            distribution_date,
            pills_needed,
            other_parent_out_date,
            refill_eligible_date,
            needs_refill_first,
            gap_days,
            action_required,
        );

        DistributionPlan {
            distribution_date,
            pills_to_give: pills_needed,
            other_parent_out_date,
            refill_eligible_date,
            needs_refill_first,
            gap_days,
            action_required,
            notes,
        }
    }
}

fn plan_notes(
    distribution_date: NaiveDate,
    pills: u32,
    out_date: NaiveDate,
    refill_date: NaiveDate,
    needs_refill_first: bool,
    gap_days: i64,
    action_required: bool,
) -> String {
    let mut lines = vec![format!(
        "Give {} pills on {}.",
        pills,
        distribution_date.format("%a %b %d")
    )];

    if action_required {
        lines.push(format!(
            "Other parent ran out on {}; distribute as soon as possible.",
            out_date.format("%a %b %d")
        ));
    }

    if needs_refill_first {
        lines.push(format!(
            "Refill not allowed until {}, after the other parent runs out on {}.",
            refill_date.format("%a %b %d"),
            out_date.format("%a %b %d")
        ));
    }

    if gap_days > 0 {
        lines.push(format!(
            "Warning: other parent will be without medication for {} day{}.",
            gap_days,
            if gap_days == 1 { "" } else { "s" }
        ));
    }

    lines.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_refill_eligible_after_85_percent() {
        let planner = DistributionPlanner::default();
        // floor(30 × 0.85) = 25
        assert_eq!(planner.refill_eligible_date(date(2025, 10, 8), 30), date(2025, 11, 2));
        // floor(7 × 0.85) = 5
        assert_eq!(planner.refill_eligible_date(date(2025, 10, 8), 7), date(2025, 10, 13));
        assert_eq!(planner.refill_eligible_date(date(2025, 10, 8), 0), date(2025, 10, 8));
    }

    #[test]
    fn test_refill_threshold_configurable() {
        let planner = DistributionPlanner::new(80);
        assert_eq!(planner.refill_eligible_date(date(2025, 10, 8), 30), date(2025, 11, 1));
    }

    #[test]
    fn test_simple_run_out() {
        assert_eq!(
            DistributionPlanner::other_parent_run_out_date(date(2025, 10, 13), 16),
            date(2025, 10, 29)
        );
    }

    #[test]
    fn test_plan_with_refill_gap() {
        let plan = DistributionPlanner::default().plan_next_distribution(
            date(2025, 10, 29),
            date(2025, 11, 2),
            date(2025, 11, 6),
            12,
            date(2025, 10, 20),
        );

        assert_eq!(plan.distribution_date, date(2025, 11, 5));
        assert_eq!(plan.pills_to_give, 12);
        assert!(plan.needs_refill_first);
        assert_eq!(plan.gap_days, 7);
        assert!(!plan.action_required);
        assert!(plan.notes.contains("7 days"));
    }

    #[test]
    fn test_plan_without_refill_wait() {
        let plan = DistributionPlanner::default().plan_next_distribution(
            date(2025, 11, 10),
            date(2025, 11, 2),
            date(2025, 11, 11),
            14,
            date(2025, 11, 10),
        );

        assert_eq!(plan.distribution_date, date(2025, 11, 10));
        assert!(!plan.needs_refill_first);
        assert_eq!(plan.gap_days, 0);
        assert!(plan.action_required);
        assert!(!plan.notes.contains("Warning"));
    }

    #[test]
    fn test_no_gap_when_handoff_before_refill_date() {
        // Refill blocked past run-out, but the handoff itself is not later than the refill date
        let plan = DistributionPlanner::default().plan_next_distribution(
            date(2025, 10, 29),
            date(2025, 11, 2),
            date(2025, 11, 3),
            10,
            date(2025, 10, 20),
        );

        assert!(plan.needs_refill_first);
        assert_eq!(plan.distribution_date, date(2025, 11, 2));
        assert_eq!(plan.gap_days, 0);
    }
}
