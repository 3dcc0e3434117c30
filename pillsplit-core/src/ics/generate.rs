//! ICS writing for reminder entries.
//!
//! Only one-off entries are written; recurrence is a read-side concern.

use chrono::{Duration, Utc};
use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger, ValueType};

use crate::entry::{CalendarEntry, EntryStatus, EntryTime};
use crate::error::{PillError, PillResult};

pub fn generate_ics(entry: &CalendarEntry) -> PillResult<String> {
    if entry.recurrence.is_some() || entry.recurrence_id.is_some() {
        return Err(PillError::IcsGenerate(format!(
            "entry '{}' is recurring; only one-off entries are written",
            entry.uid
        )));
    }

    let mut event = icalendar::Event::new();
    event.uid(&entry.uid);
    event.summary(&entry.summary);
    event.add_property("DTSTAMP", Utc::now().format("%Y%m%dT%H%M%SZ").to_string());

    event.append_property(time_property("DTSTART", &entry.start));
    event.append_property(time_property("DTEND", &entry.end));

    if let Some(description) = &entry.description {
        event.description(description);
    }

    // CONFIRMED is implied
    match entry.status {
        EntryStatus::Confirmed => {}
        EntryStatus::Tentative => {
            event.add_property("STATUS", "TENTATIVE");
        }
        EntryStatus::Cancelled => {
            event.add_property("STATUS", "CANCELLED");
        }
    }

    if let Some(color) = &entry.color {
        event.add_property("COLOR", color);
    }

    for reminder in &entry.reminders {
        let trigger = Trigger::before_start(Duration::minutes(reminder.minutes));
        event.alarm(Alarm::display(&entry.summary, trigger));
    }

    for (key, value) in &entry.custom_properties {
        event.add_property(key, value);
    }

    let mut calendar = Calendar::new();
    calendar.push(event.done());

    Ok(tidy(&calendar.done().to_string()))
}

/// Rewrite PRODID, and drop CALSCALE (the default) and the DTSTAMP/UID lines
/// icalendar adds inside each VALARM.
fn tidy(ics: &str) -> String {
    let mut out = String::with_capacity(ics.len());
    let mut in_alarm = false;

    for line in ics.lines() {
        match line {
            "BEGIN:VALARM" => in_alarm = true,
            "END:VALARM" => in_alarm = false,
            "CALSCALE:GREGORIAN" => continue,
            _ if line.starts_with("PRODID:") => {
                out.push_str("PRODID:PILLSPLIT\r\n");
                continue;
            }
            _ if in_alarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) => continue,
            _ => {}
        }

        out.push_str(line);
        out.push_str("\r\n");
    }

    out
}

fn time_property(name: &str, time: &EntryTime) -> Property {
    let mut prop = Property::new(name, time.to_ics_string());
    match time {
        EntryTime::Date(_) => {
            prop.append_parameter(ValueType::Date);
        }
        EntryTime::DateTimeZoned { tzid, .. } => {
            prop.add_parameter("TZID", tzid);
        }
        EntryTime::DateTimeUtc(_) | EntryTime::DateTimeFloating(_) => {}
    }
    prop
}
