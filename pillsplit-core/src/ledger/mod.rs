//! Fill and distribution ledger.
//!
//! # Invariants
//! - Write paths validate records before touching storage.
//! - Histories come back newest first: date descending, then id descending.
//! - Records are only created or edited; there is no delete path.

mod migrations;
mod open;
mod sqlite;

pub use migrations::latest_version;
pub use open::{open_ledger, open_ledger_in_memory};
pub use sqlite::SqliteLedger;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PillError, PillResult};
use crate::reminders::ReminderKind;

/// A prescription fill picked up by the tracked parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub id: i64,
    pub date: NaiveDate,
    pub quantity: u32,
    pub prescription_number: Option<String>,
    pub pharmacy: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFill {
    pub date: NaiveDate,
    pub quantity: u32,
    #[serde(default)]
    pub prescription_number: Option<String>,
    #[serde(default)]
    pub pharmacy: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewFill {
    pub fn new(date: NaiveDate, quantity: u32) -> Self {
        NewFill {
            date,
            quantity,
            prescription_number: None,
            pharmacy: None,
            notes: None,
        }
    }

    pub fn validate(&self) -> PillResult<()> {
        if self.quantity == 0 {
            return Err(PillError::Validation("fill quantity must be greater than 0".into()));
        }
        Ok(())
    }
}

/// Pills handed to the other parent, charged against a fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub id: i64,
    pub date: NaiveDate,
    pub quantity: u32,
    pub fill_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDistribution {
    pub date: NaiveDate,
    pub quantity: u32,
    #[serde(default)]
    pub fill_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewDistribution {
    pub fn new(date: NaiveDate, quantity: u32, fill_id: Option<i64>) -> Self {
        NewDistribution {
            date,
            quantity,
            fill_id,
            notes: None,
        }
    }

    pub fn validate(&self) -> PillResult<()> {
        if self.quantity == 0 {
            return Err(PillError::Validation(
                "distribution quantity must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// A reminder already written to the reminder calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub id: i64,
    pub kind: ReminderKind,
    pub date: NaiveDate,
    pub event_id: Option<String>,
    pub fill_id: Option<i64>,
    pub distribution_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminderRecord {
    pub kind: ReminderKind,
    pub date: NaiveDate,
    pub event_id: Option<String>,
    pub fill_id: Option<i64>,
    pub distribution_id: Option<i64>,
}

/// Storage for fills, distributions, and reminder tracking.
pub trait LedgerStore {
    fn latest_fill(&self) -> PillResult<Option<Fill>>;
    fn latest_distribution(&self) -> PillResult<Option<Distribution>>;
    fn fill_history(&self, limit: u32) -> PillResult<Vec<Fill>>;
    fn distribution_history(&self, limit: u32) -> PillResult<Vec<Distribution>>;
    /// Every distribution ever recorded, newest first.
    fn all_distributions(&self) -> PillResult<Vec<Distribution>>;
    fn get_fill(&self, id: i64) -> PillResult<Option<Fill>>;
    fn get_distribution(&self, id: i64) -> PillResult<Option<Distribution>>;

    fn add_fill(&self, fill: &NewFill) -> PillResult<Fill>;
    /// Fails with [`PillError::NotFound`] when `fill_id` names no fill.
    fn add_distribution(&self, distribution: &NewDistribution) -> PillResult<Distribution>;
    fn update_fill(&self, id: i64, fill: &NewFill) -> PillResult<Fill>;
    fn update_distribution(&self, id: i64, distribution: &NewDistribution) -> PillResult<Distribution>;

    fn add_reminder_record(&self, record: &NewReminderRecord) -> PillResult<ReminderRecord>;
    fn reminder_records(&self, kind: Option<ReminderKind>) -> PillResult<Vec<ReminderRecord>>;
}

impl<T: LedgerStore + ?Sized> LedgerStore for &T {
    fn latest_fill(&self) -> PillResult<Option<Fill>> {
        (**self).latest_fill()
    }

    fn latest_distribution(&self) -> PillResult<Option<Distribution>> {
        (**self).latest_distribution()
    }

    fn fill_history(&self, limit: u32) -> PillResult<Vec<Fill>> {
        (**self).fill_history(limit)
    }

    fn distribution_history(&self, limit: u32) -> PillResult<Vec<Distribution>> {
        (**self).distribution_history(limit)
    }

    fn all_distributions(&self) -> PillResult<Vec<Distribution>> {
        (**self).all_distributions()
    }

    fn get_fill(&self, id: i64) -> PillResult<Option<Fill>> {
        (**self).get_fill(id)
    }

    fn get_distribution(&self, id: i64) -> PillResult<Option<Distribution>> {
        (**self).get_distribution(id)
    }

    fn add_fill(&self, fill: &NewFill) -> PillResult<Fill> {
        (**self).add_fill(fill)
    }

    fn add_distribution(&self, distribution: &NewDistribution) -> PillResult<Distribution> {
        (**self).add_distribution(distribution)
    }

    fn update_fill(&self, id: i64, fill: &NewFill) -> PillResult<Fill> {
        (**self).update_fill(id, fill)
    }

    fn update_distribution(&self, id: i64, distribution: &NewDistribution) -> PillResult<Distribution> {
        (**self).update_distribution(id, distribution)
    }

    fn add_reminder_record(&self, record: &NewReminderRecord) -> PillResult<ReminderRecord> {
        (**self).add_reminder_record(record)
    }

    fn reminder_records(&self, kind: Option<ReminderKind>) -> PillResult<Vec<ReminderRecord>> {
        (**self).reminder_records(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_quantity_rejected() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 8).unwrap();

        assert!(matches!(
            NewFill::new(date, 0).validate(),
            Err(PillError::Validation(_))
        ));
        assert!(matches!(
            NewDistribution::new(date, 0, None).validate(),
            Err(PillError::Validation(_))
        ));
        assert!(NewFill::new(date, 30).validate().is_ok());
    }

    #[test]
    fn test_new_fill_optional_fields_default() {
        let fill: NewFill = serde_json::from_str(r#"{"date":"2025-10-08","quantity":30}"#).unwrap();
        assert_eq!(fill, NewFill::new(NaiveDate::from_ymd_opt(2025, 10, 8).unwrap(), 30));
    }
}
