//! Reminder events written to a calendar.
//!
//! Every reminder title starts with a searchable tag (default `[PILLS]`) and
//! carries an `X-PILLSPLIT-KIND` property, so existing reminders can be found
//! again and are not created twice.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PillConfig;
use crate::date_window::DateWindow;
use crate::entry::{CalendarEntry, Reminder};
use crate::error::PillResult;
use crate::store;

const KIND_PROPERTY: &str = "X-PILLSPLIT-KIND";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    OtherParentOut,
    RefillEligible,
    DistributionDue,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::OtherParentOut => "other_parent_out",
            ReminderKind::RefillEligible => "refill_eligible",
            ReminderKind::DistributionDue => "distribution_due",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "other_parent_out" => Some(ReminderKind::OtherParentOut),
            "refill_eligible" => Some(ReminderKind::RefillEligible),
            "distribution_due" => Some(ReminderKind::DistributionDue),
            _ => None,
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An all-day reminder to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderEvent {
    pub kind: ReminderKind,
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
    pub color_tag: String,
    /// Alarm offsets, minutes before the start of the day
    pub reminder_offsets: Vec<i64>,
}

impl ReminderEvent {
    pub fn other_parent_out(tag: &str, date: NaiveDate) -> Self {
        ReminderEvent {
            kind: ReminderKind::OtherParentOut,
            date,
            title: format!("{} Other Parent Out of Meds", tag),
            description: "The other parent runs out of medication today.".to_string(),
            color_tag: "red".to_string(),
            reminder_offsets: vec![1440],
        }
    }

    pub fn refill_eligible(tag: &str, date: NaiveDate, threshold_percent: u32) -> Self {
        ReminderEvent {
            kind: ReminderKind::RefillEligible,
            date,
            title: format!("{} Can Refill Prescription", tag),
            description: format!(
                "Eligible to refill the prescription ({}% of the supply period has elapsed). Contact the pharmacy.",
                threshold_percent
            ),
            color_tag: "blue".to_string(),
            reminder_offsets: vec![0],
        }
    }

    pub fn distribution_due(
        tag: &str,
        date: NaiveDate,
        quantity: u32,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Self {
        ReminderEvent {
            kind: ReminderKind::DistributionDue,
            date,
            title: format!("{} Give {} Pills to Other Parent", tag, quantity),
            description: format!(
                "Give {} pills to the other parent for their custody days.\n\nFor custody period: {} - {}",
                quantity,
                period_start.format("%b %d"),
                period_end.format("%b %d, %Y")
            ),
            color_tag: "green".to_string(),
            reminder_offsets: vec![60, 1440],
        }
    }

    fn to_entry(&self, uid: String) -> CalendarEntry {
        let mut entry = CalendarEntry::all_day(uid, self.title.clone(), self.date);
        entry.description = Some(self.description.clone());
        entry.color = Some(self.color_tag.clone());
        entry.reminders = self
            .reminder_offsets
            .iter()
            .map(|&minutes| Reminder { minutes })
            .collect();
        entry.custom_properties = vec![(KIND_PROPERTY.to_string(), self.kind.as_str().to_string())];
        entry
    }
}

/// A reminder found in the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedReminder {
    pub event_id: String,
    /// `None` for tagged events pillsplit did not write
    pub kind: Option<ReminderKind>,
    pub date: NaiveDate,
    pub summary: String,
}

/// Where reminders go.
pub trait ReminderSink {
    /// Write a reminder, returning its event id.
    fn create_event(&self, event: &ReminderEvent) -> PillResult<String>;

    /// Tagged reminders dated inside `window`.
    fn find_tagged(&self, window: &DateWindow) -> PillResult<Vec<TaggedReminder>>;
}

impl<T: ReminderSink + ?Sized> ReminderSink for &T {
    fn create_event(&self, event: &ReminderEvent) -> PillResult<String> {
        (**self).create_event(event)
    }

    fn find_tagged(&self, window: &DateWindow) -> PillResult<Vec<TaggedReminder>> {
        (**self).find_tagged(window)
    }
}

/// Reminders stored as `.ics` files in a calendar directory.
#[derive(Debug, Clone)]
pub struct CalendarDirSink {
    dir: PathBuf,
    tag: String,
}

impl CalendarDirSink {
    pub fn new(dir: impl Into<PathBuf>, tag: impl Into<String>) -> Self {
        CalendarDirSink {
            dir: dir.into(),
            tag: tag.into(),
        }
    }

    pub fn from_config(config: &PillConfig) -> PillResult<Self> {
        Ok(Self::new(config.reminder_dir()?, config.reminder_tag.clone()))
    }
}

impl ReminderSink for CalendarDirSink {
    fn create_event(&self, event: &ReminderEvent) -> PillResult<String> {
        let uid = format!("{}@pillsplit", uuid::Uuid::new_v4());
        let path = store::create(&self.dir, &event.to_entry(uid.clone()))?;

        info!(kind = %event.kind, date = %event.date, path = %path.display(), "created reminder");
        Ok(uid)
    }

    fn find_tagged(&self, window: &DateWindow) -> PillResult<Vec<TaggedReminder>> {
        let mut found: Vec<TaggedReminder> = store::list(&self.dir)?
            .into_iter()
            .map(|stored| stored.entry)
            .filter(|entry| entry.summary.contains(&self.tag))
            .filter_map(|entry| {
                let date = entry.start.date();
                window.contains(date).then(|| TaggedReminder {
                    kind: entry.custom_property(KIND_PROPERTY).and_then(ReminderKind::parse),
                    event_id: entry.uid,
                    date,
                    summary: entry.summary,
                })
            })
            .collect();

        found.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.event_id.cmp(&b.event_id)));
        Ok(found)
    }
}

/// Outcome of creating one reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedReminder {
    pub kind: ReminderKind,
    pub date: NaiveDate,
    pub event_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedReminder {
    pub kind: ReminderKind,
    pub date: NaiveDate,
    pub error: String,
}

/// What a reminder sync did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub created: Vec<CreatedReminder>,
    /// Reminders that already existed
    pub skipped: Vec<ReminderKind>,
    pub failed: Vec<FailedReminder>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            ReminderKind::OtherParentOut,
            ReminderKind::RefillEligible,
            ReminderKind::DistributionDue,
        ] {
            assert_eq!(ReminderKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ReminderKind::parse("mom_out"), None);
    }

    #[test]
    fn test_distribution_reminder_text() {
        let event = ReminderEvent::distribution_due(
            "[PILLS]",
            date(2025, 11, 5),
            12,
            date(2025, 11, 6),
            date(2025, 11, 30),
        );

        assert_eq!(event.title, "[PILLS] Give 12 Pills to Other Parent");
        assert!(event.description.ends_with("Nov 06 - Nov 30, 2025"));
        assert_eq!(event.reminder_offsets, vec![60, 1440]);
        assert_eq!(event.color_tag, "green");
    }

    #[test]
    fn test_sink_writes_and_finds_tagged_reminders() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CalendarDirSink::new(dir.path(), "[PILLS]");

        let id = sink
            .create_event(&ReminderEvent::refill_eligible("[PILLS]", date(2025, 11, 2), 85))
            .unwrap();
        sink.create_event(&ReminderEvent::other_parent_out("[PILLS]", date(2025, 12, 20)))
            .unwrap();

        let window = DateWindow::new(date(2025, 11, 1), date(2025, 11, 30)).unwrap();
        let found = sink.find_tagged(&window).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].event_id, id);
        assert_eq!(found[0].kind, Some(ReminderKind::RefillEligible));
        assert_eq!(found[0].date, date(2025, 11, 2));
    }

    #[test]
    fn test_untagged_events_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CalendarDirSink::new(dir.path(), "[PILLS]");
        let untagged = CalendarEntry::all_day("x".into(), "Dentist".into(), date(2025, 11, 3));
        store::create(dir.path(), &untagged).unwrap();

        let window = DateWindow::new(date(2025, 11, 1), date(2025, 11, 30)).unwrap();
        assert!(sink.find_tagged(&window).unwrap().is_empty());
    }

    #[test]
    fn test_written_reminder_has_alarms_and_color() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CalendarDirSink::new(dir.path(), "[PILLS]");
        sink.create_event(&ReminderEvent::distribution_due(
            "[PILLS]",
            date(2025, 11, 5),
            12,
            date(2025, 11, 6),
            date(2025, 11, 30),
        ))
        .unwrap();

        let stored = store::list(dir.path()).unwrap();
        let entry = &stored[0].entry;
        assert_eq!(entry.color.as_deref(), Some("green"));
        assert_eq!(entry.reminders, vec![Reminder { minutes: 60 }, Reminder { minutes: 1440 }]);
        assert_eq!(entry.start, EntryTime::Date(date(2025, 11, 5)));
    }
}
