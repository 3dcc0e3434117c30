//! Core of pillsplit: custody-aware planning of medication handoffs between
//! two co-parents.
//!
//! - `custody`: which parent gives the pill on which day
//! - `planner`: refill eligibility and the next handoff
//! - `status`: supply picture from the fill/distribution ledger
//! - `manager`: the orchestration both front ends use

pub mod config;
pub mod constants;
pub mod custody;
pub mod date_window;
pub mod entry;
pub mod error;
pub mod ics;
pub mod ledger;
pub mod manager;
pub mod planner;
pub mod recurrence;
pub mod reminders;
pub mod status;
pub mod store;
pub mod telemetry;

pub use config::PillConfig;
pub use custody::{
    CalendarDirSource, CustodyInterval, CustodyScheduler, IntervalSource, Parent, ParentDays, PillSplit,
    compute_parent_days,
};
pub use date_window::DateWindow;
pub use error::{PillError, PillResult};
pub use ledger::{
    Distribution, Fill, LedgerStore, NewDistribution, NewFill, ReminderRecord, SqliteLedger,
};
pub use manager::{History, NextDistribution, Overview, PillManager, PlannedDistribution, RunOut};
pub use planner::{DistributionPlan, DistributionPlanner};
pub use reminders::{CalendarDirSink, ReminderEvent, ReminderKind, ReminderReport, ReminderSink};
pub use status::{Status, current_status};
