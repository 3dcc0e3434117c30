//! Closed windows of calendar days.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{PillError, PillResult};

/// A closed window of calendar days, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> PillResult<Self> {
        if start > end {
            return Err(PillError::InvalidWindow { start, end });
        }
        Ok(DateWindow { start, end })
    }

    /// Window from `start` through `start + days` (both ends included).
    pub fn starting_at(start: NaiveDate, days: i64) -> Self {
        DateWindow {
            start,
            end: start + Duration::days(days.max(0)),
        }
    }

    /// Parse CLI/API arguments into a window.
    /// - `from`: YYYY-MM-DD, defaults to `today`
    /// - `to`: YYYY-MM-DD, defaults to `from + default_days`
    pub fn from_args(
        from: Option<&str>,
        to: Option<&str>,
        today: NaiveDate,
        default_days: i64,
    ) -> PillResult<Self> {
        let start = match from {
            Some(s) => parse_date(s)?,
            None => today,
        };

        match to {
            Some(s) => Self::new(start, parse_date(s)?),
            None => Ok(Self::starting_at(start, default_days)),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the window, counting both ends.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Midnight at the start of the first day.
    pub fn time_min(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Midnight after the last day (exclusive upper bound).
    pub fn time_max(&self) -> NaiveDateTime {
        (self.end + Duration::days(1)).and_time(NaiveTime::MIN)
    }
}

/// Parse YYYY-MM-DD
pub fn parse_date(s: &str) -> PillResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        PillError::Validation(format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rejects_inverted_window() {
        let err = DateWindow::new(date(2025, 11, 10), date(2025, 11, 1)).unwrap_err();
        assert!(matches!(err, PillError::InvalidWindow { .. }));
    }

    #[test]
    fn test_single_day_window() {
        let window = DateWindow::new(date(2025, 11, 1), date(2025, 11, 1)).unwrap();
        assert_eq!(window.len_days(), 1);
        assert_eq!(window.days().collect::<Vec<_>>(), vec![date(2025, 11, 1)]);
    }

    #[test]
    fn test_starting_at_includes_both_ends() {
        let window = DateWindow::starting_at(date(2025, 10, 8), 30);
        assert_eq!(window.end(), date(2025, 11, 7));
        assert_eq!(window.len_days(), 31);
        assert_eq!(window.days().count(), 31);
    }

    #[test]
    fn test_from_args_defaults() {
        let today = date(2025, 11, 1);
        let window = DateWindow::from_args(None, None, today, 14).unwrap();
        assert_eq!(window.start(), today);
        assert_eq!(window.end(), date(2025, 11, 15));

        let window = DateWindow::from_args(Some("2025-11-03"), Some("2025-11-05"), today, 14).unwrap();
        assert_eq!(window.len_days(), 3);
    }

    #[test]
    fn test_from_args_bad_date() {
        let err = DateWindow::from_args(Some("11/03/2025"), None, date(2025, 11, 1), 14).unwrap_err();
        assert!(err.to_string().contains("Expected YYYY-MM-DD"));
    }

    #[test]
    fn test_time_bounds() {
        let window = DateWindow::new(date(2025, 11, 1), date(2025, 11, 2)).unwrap();
        assert_eq!(window.time_min().to_string(), "2025-11-01 00:00:00");
        assert_eq!(window.time_max().to_string(), "2025-11-03 00:00:00");
    }
}
