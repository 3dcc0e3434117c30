//! Supply status derived from the ledger.
//!
//! Recomputed from the full distribution history on every call.

use chrono::NaiveDate;
use serde::Serialize;

use crate::ledger::{Distribution, Fill};
use crate::planner::DistributionPlanner;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Status {
    /// Nothing recorded yet. Not an error.
    NoData { reason: String },
    Active(ActiveStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveStatus {
    pub fill: FillStatus,
    pub refill: RefillStatus,
    /// Pills handed over from the current fill, across all its distributions
    pub total_distributed: u32,
    /// Negative when more was recorded as given than was filled
    pub pills_with_tracked_parent: i64,
    pub distribution: Option<DistributionStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillStatus {
    pub id: i64,
    pub date: NaiveDate,
    pub quantity: u32,
    pub pharmacy: Option<String>,
    pub prescription_number: Option<String>,
    pub days_ago: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefillStatus {
    pub eligible_date: NaiveDate,
    pub days_until: i64,
    pub can_refill: bool,
}

/// The most recent handoff and when it runs out (one pill a day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionStatus {
    pub id: i64,
    pub date: NaiveDate,
    pub quantity: u32,
    pub fill_id: Option<i64>,
    pub days_ago: i64,
    pub other_parent_out_date: NaiveDate,
    pub days_until_out: i64,
    pub is_out: bool,
}

impl Status {
    pub fn active(&self) -> Option<&ActiveStatus> {
        match self {
            Status::Active(active) => Some(active),
            Status::NoData { .. } => None,
        }
    }
}

/// Current supply picture.
///
/// `distributions` may come in any order; the latest one is picked by date,
/// then by id.
pub fn current_status(
    latest_fill: Option<&Fill>,
    distributions: &[Distribution],
    today: NaiveDate,
    planner: &DistributionPlanner,
) -> Status {
    let Some(fill) = latest_fill else {
        return Status::NoData {
            reason: "No prescription fills recorded yet".to_string(),
        };
    };

    let total_distributed: u32 = distributions
        .iter()
        .filter(|d| d.fill_id == Some(fill.id))
        .map(|d| d.quantity)
        .sum();

    let eligible_date = planner.refill_eligible_date(fill.date, fill.quantity);

    let distribution = distributions
        .iter()
        .max_by_key(|d| (d.date, d.id))
        .map(|d| {
            let out = DistributionPlanner::other_parent_run_out_date(d.date, d.quantity);
            DistributionStatus {
                id: d.id,
                date: d.date,
                quantity: d.quantity,
                fill_id: d.fill_id,
                days_ago: (today - d.date).num_days(),
                other_parent_out_date: out,
                days_until_out: (out - today).num_days(),
                is_out: today >= out,
            }
        });

    Status::Active(ActiveStatus {
        fill: FillStatus {
            id: fill.id,
            date: fill.date,
            quantity: fill.quantity,
            pharmacy: fill.pharmacy.clone(),
            prescription_number: fill.prescription_number.clone(),
            days_ago: (today - fill.date).num_days(),
        },
        refill: RefillStatus {
            eligible_date,
            days_until: (eligible_date - today).num_days(),
            can_refill: today >= eligible_date,
        },
        total_distributed,
        pills_with_tracked_parent: i64::from(fill.quantity) - i64::from(total_distributed),
        distribution,
    })
}
