//! Where custody intervals come from.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{Duration, NaiveDateTime};
use chrono_tz::Tz;
use tracing::{debug, warn};

use super::CustodyInterval;
use crate::config::PillConfig;
use crate::date_window::DateWindow;
use crate::entry::{CalendarEntry, EntryStatus};
use crate::error::{PillError, PillResult};
use crate::recurrence::expand_recurring_entry;
use crate::store;

/// Recurring masters that started up to this many days before the window can
/// still have an instance reaching into it.
const RECURRENCE_LOOKBACK_DAYS: i64 = 31;

/// A read-only view of the tracked parent's custody blocks.
pub trait IntervalSource {
    /// Intervals that touch `window` (or end on its first morning).
    fn fetch_intervals(&self, window: &DateWindow) -> PillResult<Vec<CustodyInterval>>;
}

/// Fixed intervals, mostly for tests and callers that already hold the data.
impl IntervalSource for Vec<CustodyInterval> {
    fn fetch_intervals(&self, _window: &DateWindow) -> PillResult<Vec<CustodyInterval>> {
        Ok(self.clone())
    }
}

impl<T: IntervalSource + ?Sized> IntervalSource for &T {
    fn fetch_intervals(&self, window: &DateWindow) -> PillResult<Vec<CustodyInterval>> {
        (**self).fetch_intervals(window)
    }
}

/// Custody blocks read from a calendar directory of `.ics` files.
///
/// An event is a custody block when its SUMMARY contains `label`
/// (case-sensitive, so "Custody - Thanksgiving" matches "Custody").
#[derive(Debug, Clone)]
pub struct CalendarDirSource {
    dir: PathBuf,
    label: String,
    timezone: Tz,
}

impl CalendarDirSource {
    pub fn new(dir: impl Into<PathBuf>, label: impl Into<String>, timezone: Tz) -> Self {
        CalendarDirSource {
            dir: dir.into(),
            label: label.into(),
            timezone,
        }
    }

    pub fn from_config(config: &PillConfig) -> PillResult<Self> {
        Ok(Self::new(config.custody_dir()?, config.custody_label.clone(), config.timezone()?))
    }

    fn read_entries(&self) -> PillResult<Vec<CalendarEntry>> {
        if !self.dir.is_dir() {
            return Err(PillError::UpstreamFetch(format!(
                "custody calendar directory {} does not exist",
                self.dir.display()
            )));
        }

        let stored = store::list(&self.dir).map_err(|e| {
            PillError::UpstreamFetch(format!("could not read {}: {}", self.dir.display(), e))
        })?;

        Ok(stored.into_iter().map(|s| s.entry).collect())
    }

    /// Expand recurring masters and apply their overrides.
    ///
    /// Overrides whose master is missing are kept as standalone entries.
    fn instances(
        &self,
        entries: Vec<CalendarEntry>,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> PillResult<Vec<CalendarEntry>> {
        let mut masters = Vec::new();
        let mut overrides: HashMap<String, HashMap<String, CalendarEntry>> = HashMap::new();
        let mut instances = Vec::new();

        for entry in entries {
            if entry.recurrence.is_some() {
                masters.push(entry);
            } else if let Some(recurrence_id) = &entry.recurrence_id {
                overrides
                    .entry(entry.uid.clone())
                    .or_default()
                    .insert(recurrence_id.to_ics_string(), entry);
            } else {
                instances.push(entry);
            }
        }

        let range_start = (from - Duration::days(RECURRENCE_LOOKBACK_DAYS)).and_utc();
        let range_end = (to + Duration::days(1)).and_utc();

        for master in &masters {
            let master_overrides = overrides.remove(&master.uid).unwrap_or_default();
            instances.extend(expand_recurring_entry(
                master,
                range_start,
                range_end,
                &master_overrides,
            )?);
        }

        instances.extend(overrides.into_values().flat_map(|o| o.into_values()));
        Ok(instances)
    }

    /// The entry as an interval, if it touches `[from, to)`.
    ///
    /// A malformed entry fails the fetch only when it falls inside the range;
    /// elsewhere it is logged and skipped.
    fn to_interval(
        &self,
        entry: &CalendarEntry,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> PillResult<Option<CustodyInterval>> {
        let (Some(start), Some(end)) = (entry.start.to_local(self.timezone), entry.end.to_local(self.timezone))
        else {
            return Ok(None);
        };

        match CustodyInterval::new(start, end) {
            Ok(interval) => Ok(interval.overlaps(from, to).then_some(interval)),
            Err(PillError::InvalidInterval(reason)) => {
                if start.min(end) < to && start.max(end) >= from {
                    return Err(PillError::InvalidInterval(format!("event '{}': {}", entry.uid, reason)));
                }
                warn!(uid = %entry.uid, %reason, "skipping malformed custody event outside the queried range");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl IntervalSource for CalendarDirSource {
    fn fetch_intervals(&self, window: &DateWindow) -> PillResult<Vec<CustodyInterval>> {
        // An interval ending the evening before the window still credits its first day
        let from = window.time_min() - Duration::days(1);
        let to = window.time_max();

        let entries = self.read_entries()?;
        let instances = self.instances(entries, from, to)?;

        let mut intervals = Vec::new();
        for entry in &instances {
            if entry.status == EntryStatus::Cancelled || !entry.summary.contains(&self.label) {
                continue;
            }
            if let Some(interval) = self.to_interval(entry, from, to)? {
                intervals.push(interval);
            }
        }

        intervals.sort_by_key(|i| i.start());

        debug!(
            dir = %self.dir.display(),
            entries = instances.len(),
            intervals = intervals.len(),
            "read custody calendar"
        );

        Ok(intervals)
    }
}
