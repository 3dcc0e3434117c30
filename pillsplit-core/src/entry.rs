//! Calendar entries as stored in .ics files.
//!
//! Custody blocks are read as entries and reminders are written as entries.
//! Only the properties pillsplit needs are modelled; everything else in a
//! file is ignored.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single VEVENT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: EntryTime,
    pub end: EntryTime,
    pub status: EntryStatus,

    /// RRULE and EXDATEs for master events
    pub recurrence: Option<Recurrence>,
    /// Set on instance overrides of a recurring master (RECURRENCE-ID)
    pub recurrence_id: Option<EntryTime>,

    pub reminders: Vec<Reminder>,
    /// RFC 7986 COLOR
    pub color: Option<String>,

    /// X- properties, kept so tagged reminders can be recognised
    pub custom_properties: Vec<(String, String)>,
}

impl CalendarEntry {
    /// An all-day entry covering `date`.
    pub fn all_day(uid: String, summary: String, date: NaiveDate) -> Self {
        CalendarEntry {
            uid,
            summary,
            description: None,
            start: EntryTime::Date(date),
            end: EntryTime::Date(date + chrono::Duration::days(1)),
            status: EntryStatus::Confirmed,
            recurrence: None,
            recurrence_id: None,
            reminders: Vec::new(),
            color: None,
            custom_properties: Vec::new(),
        }
    }

    pub fn custom_property(&self, name: &str) -> Option<&str> {
        self.custom_properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    pub rrule: String,
    pub exdates: Vec<EntryTime>,
}

/// A reminder/alarm, in minutes before the start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntryStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntryTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EntryTime {
    /// Calendar date as written in the file.
    pub fn date(&self) -> NaiveDate {
        match self {
            EntryTime::Date(d) => *d,
            EntryTime::DateTimeUtc(dt) => dt.date_naive(),
            EntryTime::DateTimeFloating(dt) => dt.date(),
            EntryTime::DateTimeZoned { datetime, .. } => datetime.date(),
        }
    }

    /// Wall-clock time in `tz`. `None` for all-day values, which carry no timestamp.
    ///
    /// Floating times are taken as already local. A TZID chrono-tz does not
    /// know is treated the same way.
    pub fn to_local(&self, tz: Tz) -> Option<NaiveDateTime> {
        match self {
            EntryTime::Date(_) => None,
            EntryTime::DateTimeUtc(dt) => Some(dt.with_timezone(&tz).naive_local()),
            EntryTime::DateTimeFloating(dt) => Some(*dt),
            EntryTime::DateTimeZoned { datetime, tzid } => match tzid.parse::<Tz>() {
                Ok(source_tz) => source_tz
                    .from_local_datetime(datetime)
                    .earliest()
                    .map(|dt| dt.with_timezone(&tz).naive_local()),
                Err(_) => Some(*datetime),
            },
        }
    }

    /// The value as it appears after the colon in an ICS property, used to
    /// match RECURRENCE-ID overrides against expanded occurrences.
    pub fn to_ics_string(&self) -> String {
        match self {
            EntryTime::Date(d) => d.format("%Y%m%d").to_string(),
            EntryTime::DateTimeUtc(dt) => dt.format("%Y%m%dT%H%M%SZ").to_string(),
            EntryTime::DateTimeFloating(dt) => dt.format("%Y%m%dT%H%M%S").to_string(),
            EntryTime::DateTimeZoned { datetime, .. } => datetime.format("%Y%m%dT%H%M%S").to_string(),
        }
    }
}

impl fmt::Display for EntryTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryTime::Date(d) => write!(f, "{}", d),
            EntryTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            EntryTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            EntryTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%d %H:%M"), tzid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_converted_to_local_wall_clock() {
        let time = EntryTime::DateTimeUtc(Utc.with_ymd_and_hms(2025, 11, 2, 22, 0, 0).unwrap());
        let local = time.to_local(chrono_tz::America::New_York).unwrap();
        assert_eq!(local.to_string(), "2025-11-02 17:00:00");
    }

    #[test]
    fn test_zoned_converted_between_zones() {
        let datetime = NaiveDate::from_ymd_opt(2025, 11, 2)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap();
        let time = EntryTime::DateTimeZoned {
            datetime,
            tzid: "America/Los_Angeles".to_string(),
        };

        let local = time.to_local(chrono_tz::America::New_York).unwrap();
        assert_eq!(local.to_string(), "2025-11-03 02:30:00");
    }

    #[test]
    fn test_all_day_has_no_timestamp() {
        let time = EntryTime::Date(NaiveDate::from_ymd_opt(2025, 11, 2).unwrap());
        assert_eq!(time.to_local(Tz::UTC), None);
    }
}
