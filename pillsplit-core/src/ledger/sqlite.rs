//! SQLite-backed ledger.

use std::path::Path;

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use super::open::{open_ledger, open_ledger_in_memory};
use super::{
    Distribution, Fill, LedgerStore, NewDistribution, NewFill, NewReminderRecord, ReminderRecord,
};
use crate::error::{PillError, PillResult};
use crate::reminders::ReminderKind;

const FILL_SELECT_SQL: &str = "SELECT
    id,
    fill_date,
    quantity,
    prescription_number,
    pharmacy,
    notes,
    created_at
FROM fills";

const DISTRIBUTION_SELECT_SQL: &str = "SELECT
    id,
    distribution_date,
    quantity,
    fill_id,
    notes,
    created_at
FROM distributions";

const REMINDER_SELECT_SQL: &str = "SELECT
    id,
    kind,
    event_date,
    event_id,
    fill_id,
    distribution_id,
    created_at
FROM reminder_events";

/// Ledger over one SQLite connection.
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    pub fn new(conn: Connection) -> Self {
        SqliteLedger { conn }
    }

    pub fn open(path: impl AsRef<Path>) -> PillResult<Self> {
        Ok(Self::new(open_ledger(path)?))
    }

    pub fn open_in_memory() -> PillResult<Self> {
        Ok(Self::new(open_ledger_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_fills(&self, limit: Option<u32>) -> PillResult<Vec<Fill>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FILL_SELECT_SQL} ORDER BY fill_date DESC, id DESC LIMIT ?1;"
        ))?;
        let fills = stmt
            .query_map(params![limit_param(limit)], parse_fill_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fills)
    }

    fn query_distributions(&self, limit: Option<u32>) -> PillResult<Vec<Distribution>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DISTRIBUTION_SELECT_SQL} ORDER BY distribution_date DESC, id DESC LIMIT ?1;"
        ))?;
        let distributions = stmt
            .query_map(params![limit_param(limit)], parse_distribution_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(distributions)
    }

    fn require_fill(&self, fill_id: Option<i64>) -> PillResult<()> {
        if let Some(id) = fill_id
            && self.get_fill(id)?.is_none()
        {
            return Err(PillError::NotFound { kind: "fill", id });
        }
        Ok(())
    }
}

/// SQLite treats a negative LIMIT as "no limit".
fn limit_param(limit: Option<u32>) -> i64 {
    limit.map_or(-1, i64::from)
}

impl LedgerStore for SqliteLedger {
    fn latest_fill(&self) -> PillResult<Option<Fill>> {
        Ok(self.query_fills(Some(1))?.into_iter().next())
    }

    fn latest_distribution(&self) -> PillResult<Option<Distribution>> {
        Ok(self.query_distributions(Some(1))?.into_iter().next())
    }

    fn fill_history(&self, limit: u32) -> PillResult<Vec<Fill>> {
        self.query_fills(Some(limit))
    }

    fn distribution_history(&self, limit: u32) -> PillResult<Vec<Distribution>> {
        self.query_distributions(Some(limit))
    }

    fn all_distributions(&self) -> PillResult<Vec<Distribution>> {
        self.query_distributions(None)
    }

    fn get_fill(&self, id: i64) -> PillResult<Option<Fill>> {
        let fill = self
            .conn
            .query_row(
                &format!("{FILL_SELECT_SQL} WHERE id = ?1;"),
                params![id],
                parse_fill_row,
            )
            .optional()?;
        Ok(fill)
    }

    fn get_distribution(&self, id: i64) -> PillResult<Option<Distribution>> {
        let distribution = self
            .conn
            .query_row(
                &format!("{DISTRIBUTION_SELECT_SQL} WHERE id = ?1;"),
                params![id],
                parse_distribution_row,
            )
            .optional()?;
        Ok(distribution)
    }

    fn add_fill(&self, fill: &NewFill) -> PillResult<Fill> {
        fill.validate()?;

        self.conn.execute(
            "INSERT INTO fills (
                fill_date,
                quantity,
                prescription_number,
                pharmacy,
                notes,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                fill.date,
                fill.quantity,
                fill.prescription_number.as_deref(),
                fill.pharmacy.as_deref(),
                fill.notes.as_deref(),
                Utc::now(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(id, date = %fill.date, quantity = fill.quantity, "recorded fill");

        self.get_fill(id)?
            .ok_or(PillError::NotFound { kind: "fill", id })
    }

    fn add_distribution(&self, distribution: &NewDistribution) -> PillResult<Distribution> {
        distribution.validate()?;
        self.require_fill(distribution.fill_id)?;

        self.conn.execute(
            "INSERT INTO distributions (
                distribution_date,
                quantity,
                fill_id,
                notes,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                distribution.date,
                distribution.quantity,
                distribution.fill_id,
                distribution.notes.as_deref(),
                Utc::now(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(
            id,
            date = %distribution.date,
            quantity = distribution.quantity,
            fill_id = ?distribution.fill_id,
            "recorded distribution"
        );

        self.get_distribution(id)?
            .ok_or(PillError::NotFound { kind: "distribution", id })
    }

    fn update_fill(&self, id: i64, fill: &NewFill) -> PillResult<Fill> {
        fill.validate()?;

        let changed = self.conn.execute(
            "UPDATE fills
             SET
                fill_date = ?1,
                quantity = ?2,
                prescription_number = ?3,
                pharmacy = ?4,
                notes = ?5
             WHERE id = ?6;",
            params![
                fill.date,
                fill.quantity,
                fill.prescription_number.as_deref(),
                fill.pharmacy.as_deref(),
                fill.notes.as_deref(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(PillError::NotFound { kind: "fill", id });
        }
        info!(id, date = %fill.date, quantity = fill.quantity, "updated fill");

        self.get_fill(id)?
            .ok_or(PillError::NotFound { kind: "fill", id })
    }

    fn update_distribution(&self, id: i64, distribution: &NewDistribution) -> PillResult<Distribution> {
        distribution.validate()?;
        self.require_fill(distribution.fill_id)?;

        let changed = self.conn.execute(
            "UPDATE distributions
             SET
                distribution_date = ?1,
                quantity = ?2,
                fill_id = ?3,
                notes = ?4
             WHERE id = ?5;",
            params![
                distribution.date,
                distribution.quantity,
                distribution.fill_id,
                distribution.notes.as_deref(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(PillError::NotFound { kind: "distribution", id });
        }
        info!(id, date = %distribution.date, quantity = distribution.quantity, "updated distribution");

        self.get_distribution(id)?
            .ok_or(PillError::NotFound { kind: "distribution", id })
    }

    fn add_reminder_record(&self, record: &NewReminderRecord) -> PillResult<ReminderRecord> {
        self.conn.execute(
            "INSERT INTO reminder_events (
                kind,
                event_date,
                event_id,
                fill_id,
                distribution_id,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                record.kind.as_str(),
                record.date,
                record.event_id.as_deref(),
                record.fill_id,
                record.distribution_id,
                Utc::now(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        let stored = self
            .conn
            .query_row(
                &format!("{REMINDER_SELECT_SQL} WHERE id = ?1;"),
                params![id],
                parse_reminder_row,
            )?;
        Ok(stored)
    }

    fn reminder_records(&self, kind: Option<ReminderKind>) -> PillResult<Vec<ReminderRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REMINDER_SELECT_SQL}
             WHERE (?1 IS NULL OR kind = ?1)
             ORDER BY event_date DESC, id DESC;"
        ))?;
        let records = stmt
            .query_map(params![kind.map(|k| k.as_str())], parse_reminder_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn parse_fill_row(row: &Row<'_>) -> rusqlite::Result<Fill> {
    Ok(Fill {
        id: row.get("id")?,
        date: row.get("fill_date")?,
        quantity: row.get("quantity")?,
        prescription_number: row.get("prescription_number")?,
        pharmacy: row.get("pharmacy")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_distribution_row(row: &Row<'_>) -> rusqlite::Result<Distribution> {
    Ok(Distribution {
        id: row.get("id")?,
        date: row.get("distribution_date")?,
        quantity: row.get("quantity")?,
        fill_id: row.get("fill_id")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_reminder_row(row: &Row<'_>) -> rusqlite::Result<ReminderRecord> {
    let kind: String = row.get("kind")?;
    let kind = ReminderKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown reminder kind '{kind}'").into(),
        )
    })?;

    Ok(ReminderRecord {
        id: row.get("id")?,
        kind,
        date: row.get("event_date")?,
        event_id: row.get("event_id")?,
        fill_id: row.get("fill_id")?,
        distribution_id: row.get("distribution_id")?,
        created_at: row.get("created_at")?,
    })
}
