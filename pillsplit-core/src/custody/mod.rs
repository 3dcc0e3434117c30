//! Custody schedule: which parent gives the pill on which day.
//!
//! The tracked parent's custody blocks are the only thing recorded; the
//! other parent's days are the complement. Attribution follows the handoff
//! convention "whoever the child wakes up with gives the pill", implemented
//! by [`credited_days`] and nowhere else.

pub mod source;

pub use source::{CalendarDirSource, IntervalSource};

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::date_window::DateWindow;
use crate::error::{PillError, PillResult};

/// One contiguous block of custody by the tracked parent, in local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustodyInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl CustodyInterval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> PillResult<Self> {
        if start >= end {
            return Err(PillError::InvalidInterval(format!(
                "custody block must end after it starts ({} → {})",
                start, end
            )));
        }
        Ok(CustodyInterval { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Does the interval touch `[from, to)`?
    pub fn overlaps(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        self.start < to && self.end > from
    }
}

/// Days credited to the tracked parent for one custody block.
///
/// The handoff happens in the evening: the morning of the start day belongs to
/// the other parent, and the morning of the end day is still the tracked
/// parent's. So the credited days are `start + 1 ..= end`.
fn credited_days(interval: &CustodyInterval) -> impl Iterator<Item = NaiveDate> + use<> {
    let first = interval.start.date() + Duration::days(1);
    let last = interval.end.date();
    first.iter_days().take_while(move |d| *d <= last)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parent {
    Tracked,
    Other,
}

/// Per-day attribution over a window. `tracked` and `other` partition the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentDays {
    pub window: DateWindow,
    pub tracked: BTreeSet<NaiveDate>,
    pub other: BTreeSet<NaiveDate>,
}

impl ParentDays {
    pub fn parent_on(&self, date: NaiveDate) -> Option<Parent> {
        if self.tracked.contains(&date) {
            Some(Parent::Tracked)
        } else if self.other.contains(&date) {
            Some(Parent::Other)
        } else {
            None
        }
    }

    pub fn split(&self) -> PillSplit {
        PillSplit {
            window: self.window,
            total_days: self.window.len_days(),
            tracked_days: self.tracked.iter().copied().collect(),
            tracked_pills: self.tracked.len() as u32,
            other_days: self.other.iter().copied().collect(),
            other_pills: self.other.len() as u32,
        }
    }
}

/// Pill counts per parent over a window (one pill per day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PillSplit {
    pub window: DateWindow,
    pub total_days: i64,
    pub tracked_days: Vec<NaiveDate>,
    pub tracked_pills: u32,
    pub other_days: Vec<NaiveDate>,
    pub other_pills: u32,
}

/// Attribute every day of `window` to a parent.
///
/// Overlapping intervals are unioned, so the result does not depend on
/// the order or multiplicity of `intervals`.
pub fn compute_parent_days(window: DateWindow, intervals: &[CustodyInterval]) -> ParentDays {
    let tracked: BTreeSet<NaiveDate> = intervals
        .iter()
        .flat_map(credited_days)
        .filter(|d| window.contains(*d))
        .collect();

    let other: BTreeSet<NaiveDate> = window.days().filter(|d| !tracked.contains(d)).collect();

    ParentDays {
        window,
        tracked,
        other,
    }
}

/// First other-parent day strictly after `after`, within `horizon_days`.
pub fn first_other_parent_day(
    after: NaiveDate,
    intervals: &[CustodyInterval],
    horizon_days: i64,
) -> PillResult<NaiveDate> {
    let window = DateWindow::new(after + Duration::days(1), after + Duration::days(horizon_days.max(1)))?;
    let days = compute_parent_days(window, intervals);

    days.other.first().copied().ok_or_else(|| {
        PillError::DataIntegrity(format!(
            "no other-parent day within {} days after {}; check the custody calendar for a missing handoff",
            horizon_days, after
        ))
    })
}

/// Searches custody data through an [`IntervalSource`].
///
/// Every query takes a fresh snapshot from the source; nothing is cached
/// between calls because the custody calendar can be edited at any time.
pub struct CustodyScheduler<S> {
    source: S,
    horizon_days: i64,
}

impl<S: IntervalSource> CustodyScheduler<S> {
    pub fn new(source: S, horizon_days: i64) -> Self {
        CustodyScheduler {
            source,
            horizon_days: horizon_days.max(1),
        }
    }

    pub fn parent_days(&self, window: DateWindow) -> PillResult<ParentDays> {
        let intervals = self.source.fetch_intervals(&window)?;
        debug!(
            from = %window.start(),
            to = %window.end(),
            intervals = intervals.len(),
            "fetched custody intervals"
        );
        Ok(compute_parent_days(window, &intervals))
    }

    pub fn pill_split(&self, window: DateWindow) -> PillResult<PillSplit> {
        Ok(self.parent_days(window)?.split())
    }

    /// Next day after `after` on which the other parent gives the pill.
    ///
    /// Fails with [`PillError::DataIntegrity`] when the horizon holds only
    /// tracked-parent days.
    pub fn next_other_parent_day(&self, after: NaiveDate) -> PillResult<NaiveDate> {
        let window = DateWindow::new(
            after + Duration::days(1),
            after + Duration::days(self.horizon_days),
        )?;
        let intervals = self.source.fetch_intervals(&window)?;
        first_other_parent_day(after, &intervals, self.horizon_days)
    }

    /// The `n`-th other-parent day strictly after `after` (1-based).
    ///
    /// The search covers `n × horizon_days` days, enough for any schedule
    /// that gives the other parent at least one day per horizon.
    pub fn nth_other_parent_day(&self, after: NaiveDate, n: u32) -> PillResult<NaiveDate> {
        let n = n.max(1);
        let search_days = i64::from(n) * self.horizon_days;
        let window = DateWindow::new(after + Duration::days(1), after + Duration::days(search_days))?;

        let days = self.parent_days(window)?;

        days.other.iter().nth(n as usize - 1).copied().ok_or_else(|| {
            PillError::DataIntegrity(format!(
                "only {} other-parent days in the {} days after {}; expected at least {}",
                days.other.len(),
                search_days,
                after,
                n
            ))
        })
    }

    /// First other-parent day on which a supply of `quantity` pills handed over
    /// on `distribution_date` is gone.
    ///
    /// The other parent uses one pill on each of their own days after the
    /// handoff, so this is their `quantity + 1`-th day after `distribution_date`.
    pub fn custody_run_out_date(&self, distribution_date: NaiveDate, quantity: u32) -> PillResult<NaiveDate> {
        self.nth_other_parent_day(distribution_date, quantity.saturating_add(1))
    }
}
