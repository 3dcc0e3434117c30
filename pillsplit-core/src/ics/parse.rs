//! ICS file parsing using the icalendar crate's parser.

use chrono::{NaiveDate, NaiveDateTime};
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Property, read_calendar, unfold},
};

use crate::entry::{CalendarEntry, EntryStatus, EntryTime, Recurrence, Reminder};

/// Parse ICS content into a CalendarEntry (first VEVENT only)
pub fn parse_entry(content: &str) -> Option<CalendarEntry> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    // Required fields
    let uid = vevent.find_prop("UID")?.val.to_string();
    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(No title)".to_string());
    let start = to_entry_time(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?);
    let end = to_entry_time(DatePerhapsTime::try_from(vevent.find_prop("DTEND")?).ok()?);

    let description = vevent.find_prop("DESCRIPTION").map(|p| p.val.to_string());
    let color = vevent.find_prop("COLOR").map(|p| p.val.to_string());

    let status = vevent
        .find_prop("STATUS")
        .map(|p| match p.val.as_ref() {
            "TENTATIVE" => EntryStatus::Tentative,
            "CANCELLED" => EntryStatus::Cancelled,
            _ => EntryStatus::Confirmed,
        })
        .unwrap_or(EntryStatus::Confirmed);

    // Recurrence (RRULE, EXDATE)
    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let exdates: Vec<EntryTime> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(parse_exdate_property)
        .collect();
    let recurrence = rrule.map(|rrule| Recurrence { rrule, exdates });

    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_entry_time);

    let reminders: Vec<Reminder> = vevent
        .components
        .iter()
        .filter(|c| c.name == "VALARM")
        .filter_map(|alarm| {
            let trigger = alarm.find_prop("TRIGGER")?.val.as_ref();
            let minutes = parse_trigger_minutes(trigger)?;
            Some(Reminder { minutes })
        })
        .collect();

    let custom_properties: Vec<(String, String)> = vevent
        .properties
        .iter()
        .filter(|p| p.name.as_ref().starts_with("X-"))
        .map(|p| (p.name.to_string(), p.val.to_string()))
        .collect();

    Some(CalendarEntry {
        uid,
        summary,
        description,
        start,
        end,
        status,
        recurrence,
        recurrence_id,
        reminders,
        color,
        custom_properties,
    })
}

fn to_entry_time(value: DatePerhapsTime) -> EntryTime {
    match value {
        DatePerhapsTime::Date(date) => EntryTime::Date(date),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => EntryTime::DateTimeUtc(dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => EntryTime::DateTimeFloating(naive),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            EntryTime::DateTimeZoned {
                datetime: date_time,
                tzid,
            }
        }
    }
}

/// EXDATE values, which may be a comma-separated list sharing one TZID or
/// VALUE=DATE parameter.
fn parse_exdate_property(prop: &Property) -> Vec<EntryTime> {
    let param = |key: &str| {
        prop.params
            .iter()
            .find(|p| p.key == key)
            .and_then(|p| p.val.as_ref())
            .map(|v| v.to_string())
    };
    let tzid = param("TZID");
    let all_day = param("VALUE").as_deref() == Some("DATE");

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .filter_map(|raw| exdate_value(raw, tzid.as_deref(), all_day))
        .collect()
}

fn exdate_value(raw: &str, tzid: Option<&str>, all_day: bool) -> Option<EntryTime> {
    const STAMP: &str = "%Y%m%dT%H%M%S";

    if all_day {
        return NaiveDate::parse_from_str(raw, "%Y%m%d").ok().map(EntryTime::Date);
    }

    match (tzid, raw.strip_suffix('Z')) {
        (Some(tzid), _) => NaiveDateTime::parse_from_str(raw, STAMP)
            .ok()
            .map(|datetime| EntryTime::DateTimeZoned {
                datetime,
                tzid: tzid.to_string(),
            }),
        (None, Some(utc)) => NaiveDateTime::parse_from_str(utc, STAMP)
            .ok()
            .map(|dt| EntryTime::DateTimeUtc(dt.and_utc())),
        (None, None) => NaiveDateTime::parse_from_str(raw, STAMP)
            .ok()
            .map(EntryTime::DateTimeFloating),
    }
}

/// Parse TRIGGER value to minutes before event (-PT30M, -P1D, etc.)
fn parse_trigger_minutes(value: &str) -> Option<i64> {
    let is_before = value.starts_with('-');
    let duration_str = value.trim_start_matches('-');

    let duration = iso8601::duration(duration_str).ok()?;
    let std_duration: std::time::Duration = duration.into();
    let minutes = (std_duration.as_secs() / 60) as i64;

    Some(if is_before { minutes } else { -minutes })
}
