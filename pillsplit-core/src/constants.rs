/// Days searched ahead for the other parent's next pill day.
/// Custody patterns repeat within two weeks.
pub const DEFAULT_HORIZON_DAYS: i64 = 14;

/// Insurance allows a refill once this share of the supply period has elapsed.
pub const DEFAULT_REFILL_THRESHOLD_PERCENT: u32 = 85;

/// Length of the period a distribution is planned for.
pub const DEFAULT_PLANNING_PERIOD_DAYS: i64 = 30;

/// Title substring identifying the tracked parent's custody blocks.
pub const DEFAULT_CUSTODY_LABEL: &str = "Custody";

/// Searchable tag put on every generated reminder.
pub const DEFAULT_REMINDER_TAG: &str = "[PILLS]";

pub const DEFAULT_TIMEZONE: &str = "UTC";

pub const DEFAULT_SERVER_PORT: u16 = 5001;
