//! Opening ledger connections.
//!
//! Returned connections have `foreign_keys=ON`, a 5 second busy timeout, and
//! every migration applied.

use std::path::Path;
use std::time::{Duration, Instant};

use rusqlite::Connection;
use tracing::{error, info};

use super::migrations::apply_migrations;
use crate::error::PillResult;

/// Open (creating if needed) the ledger database at `path`.
pub fn open_ledger(path: impl AsRef<Path>) -> PillResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut conn = Connection::open(path).inspect_err(|err| {
        error!(path = %path.display(), %err, "could not open ledger");
    })?;

    bootstrap_connection(&mut conn).inspect_err(|err| {
        error!(path = %path.display(), %err, "could not prepare ledger");
    })?;

    info!(
        path = %path.display(),
        duration_ms = started_at.elapsed().as_millis() as u64,
        "opened ledger"
    );
    Ok(conn)
}

pub fn open_ledger_in_memory() -> PillResult<Connection> {
    let mut conn = Connection::open_in_memory()?;
    bootstrap_connection(&mut conn)?;
    Ok(conn)
}

fn bootstrap_connection(conn: &mut Connection) -> PillResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("ledger.db");

        let conn = open_ledger(&path).unwrap();
        assert!(path.exists());

        let fk: i64 = conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0)).unwrap();
        assert_eq!(fk, 1);
    }
}
