//! Calendar directories: one `.ics` file per entry.

use std::path::{Path, PathBuf};

use crate::entry::{CalendarEntry, EntryTime};
use crate::error::{PillError, PillResult};
use crate::ics;

/// An entry together with the file it was read from.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub path: PathBuf,
    pub entry: CalendarEntry,
}

/// Read every parseable `.ics` file in `dir`.
///
/// Files that fail to parse are skipped. A missing directory is an empty list.
pub fn list(dir: &Path) -> PillResult<Vec<StoredEntry>> {
    let mut entries = Vec::new();

    if !dir.exists() {
        return Ok(entries);
    }

    for dir_entry in std::fs::read_dir(dir)? {
        let path = dir_entry?.path();

        if path.extension().map(|e| e == "ics").unwrap_or(false)
            && let Ok(content) = std::fs::read_to_string(&path)
            && let Some(entry) = ics::parse_entry(&content)
        {
            entries.push(StoredEntry { path, entry });
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Write `entry` as a new file in `dir`, creating the directory if needed.
pub fn create(dir: &Path, entry: &CalendarEntry) -> PillResult<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let content = ics::generate_ics(entry)?;
    let filename = unique_filename(&base_filename(entry), dir, &entry.uid)?;
    let path = dir.join(filename);

    std::fs::write(&path, content)?;
    Ok(path)
}

fn base_filename(entry: &CalendarEntry) -> String {
    let slug = slugify(&entry.summary);

    let date_part = match &entry.start {
        EntryTime::Date(d) => d.format("%Y-%m-%d").to_string(),
        EntryTime::DateTimeUtc(dt) => dt.format("%Y-%m-%dT%H%M").to_string(),
        EntryTime::DateTimeFloating(dt) => dt.format("%Y-%m-%dT%H%M").to_string(),
        EntryTime::DateTimeZoned { datetime, .. } => datetime.format("%Y-%m-%dT%H%M").to_string(),
    };

    format!("{}__{}.ics", date_part, slug)
}

/// Filename-safe form of a summary, at most 50 characters.
fn slugify(summary: &str) -> String {
    let slug = slug::slugify(summary);
    slug.chars().take(50).collect::<String>().trim_end_matches('-').to_string()
}

/// Pick a free filename, adding -2, -3, etc. on collision.
/// A file that already holds `own_uid` is reused.
fn unique_filename(base_filename: &str, dir: &Path, own_uid: &str) -> PillResult<String> {
    let base = base_filename.trim_end_matches(".ics");

    let candidates =
        std::iter::once(base_filename.to_string()).chain((2..=100).map(|n| format!("{}-{}.ics", base, n)));

    for candidate in candidates {
        let path = dir.join(&candidate);
        if !path.exists() || holds_uid(&path, own_uid) {
            return Ok(candidate);
        }
    }

    Err(PillError::IcsGenerate(format!(
        "Too many files named like {} in {}",
        base_filename,
        dir.display()
    )))
}

fn holds_uid(path: &Path, uid: &str) -> bool {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| ics::parse_entry(&content))
        .is_some_and(|entry| entry.uid == uid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reminder(uid: &str) -> CalendarEntry {
        CalendarEntry::all_day(
            uid.to_string(),
            "[PILLS] Can Refill Prescription".to_string(),
            NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
        )
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("[PILLS] Give 12 Pills"), "pills-give-12-pills");
        assert_eq!(slugify("  Custody -- weekend  "), "custody-weekend");
    }

    #[test]
    fn test_create_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = create(dir.path(), &reminder("a@pillsplit")).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "2025-11-02__pills-can-refill-prescription.ics"
        );

        let listed = list(dir.path()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].entry.uid, "a@pillsplit");
    }

    #[test]
    fn test_colliding_names_get_suffix() {
        let dir = tempfile::tempdir().unwrap();
        create(dir.path(), &reminder("a@pillsplit")).unwrap();
        let second = create(dir.path(), &reminder("b@pillsplit")).unwrap();

        assert!(second.to_string_lossy().ends_with("prescription-2.ics"));
        assert_eq!(list(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_dir_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_non_ics_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("broken.ics"), "not a calendar").unwrap();

        assert!(list(dir.path()).unwrap().is_empty());
    }
}
