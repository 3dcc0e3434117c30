//! RRULE expansion for recurring custody blocks.
//!
//! Expands a master recurring entry into individual instances within a range,
//! respecting EXDATEs and instance overrides.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rrule::RRuleSet;

use crate::entry::{CalendarEntry, EntryTime, Recurrence};
use crate::error::{PillError, PillResult};

/// Maximum occurrences expanded per master.
const MAX_OCCURRENCES: u16 = 365;

/// Build an iCalendar-format RRULE string for the rrule crate parser.
fn build_rrule_string(start: &EntryTime, recurrence: &Recurrence) -> String {
    let mut lines = vec![format_rrule_time("DTSTART", start)];
    lines.push(format!("RRULE:{}", recurrence.rrule));
    for exdate in &recurrence.exdates {
        lines.push(format_rrule_time("EXDATE", exdate));
    }
    lines.join("\n")
}

/// The rrule crate needs a datetime, so all-day dates become midnight UTC
/// and floating times are read as UTC.
fn format_rrule_time(name: &str, time: &EntryTime) -> String {
    match time {
        EntryTime::Date(d) => format!("{}:{}T000000Z", name, d.format("%Y%m%d")),
        EntryTime::DateTimeUtc(dt) => format!("{}:{}", name, dt.format("%Y%m%dT%H%M%SZ")),
        EntryTime::DateTimeFloating(dt) => format!("{}:{}Z", name, dt.format("%Y%m%dT%H%M%S")),
        EntryTime::DateTimeZoned { datetime, tzid } => {
            format!("{};TZID={}:{}", name, tzid, datetime.format("%Y%m%dT%H%M%S"))
        }
    }
}

/// Convert an rrule occurrence back to an EntryTime matching the master's variant.
fn occurrence_to_entry_time(dt: &DateTime<rrule::Tz>, master_start: &EntryTime) -> EntryTime {
    match master_start {
        EntryTime::Date(_) => EntryTime::Date(dt.date_naive()),
        EntryTime::DateTimeUtc(_) => EntryTime::DateTimeUtc(dt.with_timezone(&Utc)),
        EntryTime::DateTimeFloating(_) => EntryTime::DateTimeFloating(dt.naive_utc()),
        EntryTime::DateTimeZoned { tzid, .. } => EntryTime::DateTimeZoned {
            datetime: dt.naive_local(),
            tzid: tzid.clone(),
        },
    }
}

/// Wall-clock value as written, used to measure the master's length.
fn written_naive(time: &EntryTime) -> NaiveDateTime {
    match time {
        EntryTime::Date(d) => d.and_time(chrono::NaiveTime::MIN),
        EntryTime::DateTimeUtc(dt) => dt.naive_utc(),
        EntryTime::DateTimeFloating(dt) => *dt,
        EntryTime::DateTimeZoned { datetime, .. } => *datetime,
    }
}

/// Shift an occurrence start by `duration`, keeping the EntryTime variant.
fn shifted(start: &EntryTime, duration: Duration) -> EntryTime {
    match start {
        EntryTime::Date(d) => EntryTime::Date(*d + Duration::days(duration.num_days())),
        EntryTime::DateTimeUtc(dt) => EntryTime::DateTimeUtc(*dt + duration),
        EntryTime::DateTimeFloating(dt) => EntryTime::DateTimeFloating(*dt + duration),
        EntryTime::DateTimeZoned { datetime, tzid } => EntryTime::DateTimeZoned {
            datetime: *datetime + duration,
            tzid: tzid.clone(),
        },
    }
}

/// Expand a recurring master entry into instances starting within [range_start, range_end].
///
/// `overrides` maps RECURRENCE-ID ICS strings to override entries. An override
/// replaces the generated instance for its occurrence. The master itself is
/// not returned.
pub fn expand_recurring_entry(
    master: &CalendarEntry,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    overrides: &HashMap<String, CalendarEntry>,
) -> PillResult<Vec<CalendarEntry>> {
    let Some(recurrence) = &master.recurrence else {
        return Ok(Vec::new());
    };

    let rrule_str = build_rrule_string(&master.start, recurrence);

    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        PillError::IcsParse(format!(
            "Failed to parse RRULE for entry '{}': {}",
            master.uid, e
        ))
    })?;

    // after/before are exclusive
    let tz: rrule::Tz = Utc.into();
    let after = (range_start - Duration::seconds(1)).with_timezone(&tz);
    let before = (range_end + Duration::seconds(1)).with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);

    let duration = written_naive(&master.end) - written_naive(&master.start);

    let mut instances = Vec::new();

    for occ_dt in &result.dates {
        let start = occurrence_to_entry_time(occ_dt, &master.start);

        if let Some(override_entry) = overrides.get(&start.to_ics_string()) {
            instances.push(override_entry.clone());
            continue;
        }

        instances.push(CalendarEntry {
            uid: master.uid.clone(),
            summary: master.summary.clone(),
            description: master.description.clone(),
            end: shifted(&start, duration),
            start: start.clone(),
            status: master.status.clone(),
            recurrence: None,
            recurrence_id: Some(start),
            reminders: master.reminders.clone(),
            color: master.color.clone(),
            custom_properties: master.custom_properties.clone(),
        });
    }

    Ok(instances)
}
