//! Global pillsplit configuration.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CUSTODY_LABEL, DEFAULT_HORIZON_DAYS, DEFAULT_PLANNING_PERIOD_DAYS,
    DEFAULT_REFILL_THRESHOLD_PERCENT, DEFAULT_REMINDER_TAG, DEFAULT_SERVER_PORT, DEFAULT_TIMEZONE,
};
use crate::error::{PillError, PillResult};
use crate::planner::DistributionPlanner;

static DEFAULT_CUSTODY_DIR: &str = "~/calendar/custody";
static DEFAULT_DATABASE_PATH: &str = "~/.local/share/pillsplit/ledger.db";

fn default_custody_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CUSTODY_DIR)
}

fn default_custody_label() -> String {
    DEFAULT_CUSTODY_LABEL.to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_PATH)
}

fn default_reminder_tag() -> String {
    DEFAULT_REMINDER_TAG.to_string()
}

fn default_refill_threshold_percent() -> u32 {
    DEFAULT_REFILL_THRESHOLD_PERCENT
}

fn default_horizon_days() -> i64 {
    DEFAULT_HORIZON_DAYS
}

fn default_planning_period_days() -> i64 {
    DEFAULT_PLANNING_PERIOD_DAYS
}

fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

/// Configuration at ~/.config/pillsplit/config.toml, overlaid by
/// `PILLSPLIT_*` environment variables (e.g. `PILLSPLIT_CUSTODY_DIR`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PillConfig {
    /// Calendar directory holding the tracked parent's custody blocks
    #[serde(default = "default_custody_dir")]
    pub custody_dir: PathBuf,

    /// Substring identifying custody blocks in event titles
    #[serde(default = "default_custody_label")]
    pub custody_label: String,

    /// IANA zone the custody handoffs happen in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Where reminder events are written. Defaults to the custody directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_dir: Option<PathBuf>,

    #[serde(default = "default_reminder_tag")]
    pub reminder_tag: String,

    #[serde(default = "default_refill_threshold_percent")]
    pub refill_threshold_percent: u32,

    #[serde(default = "default_horizon_days")]
    pub horizon_days: i64,

    #[serde(default = "default_planning_period_days")]
    pub planning_period_days: i64,

    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

impl Default for PillConfig {
    fn default() -> Self {
        PillConfig {
            custody_dir: default_custody_dir(),
            custody_label: default_custody_label(),
            timezone: default_timezone(),
            database_path: default_database_path(),
            reminder_dir: None,
            reminder_tag: default_reminder_tag(),
            refill_threshold_percent: default_refill_threshold_percent(),
            horizon_days: default_horizon_days(),
            planning_period_days: default_planning_period_days(),
            server_port: default_server_port(),
        }
    }
}

impl PillConfig {
    pub fn config_path() -> PillResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PillError::Config("Could not determine config directory".into()))?
            .join("pillsplit");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented default file first
    /// if there is none.
    pub fn load() -> PillResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> PillResult<Self> {
        let config: PillConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("PILLSPLIT").try_parsing(true))
            .build()
            .map_err(|e| PillError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PillError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> PillResult<()> {
        if self.refill_threshold_percent == 0 || self.refill_threshold_percent > 100 {
            return Err(PillError::Config(format!(
                "refill_threshold_percent must be between 1 and 100, got {}",
                self.refill_threshold_percent
            )));
        }
        if self.horizon_days < 1 {
            return Err(PillError::Config("horizon_days must be at least 1".into()));
        }
        if self.planning_period_days < 0 {
            return Err(PillError::Config("planning_period_days cannot be negative".into()));
        }
        self.timezone()?;
        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> PillResult<()> {
        let contents = format!(
            "\
# pillsplit configuration

# Calendar directory with the tracked parent's custody blocks (.ics files):
# custody_dir = \"{}\"

# Events whose title contains this label are custody blocks:
# custody_label = \"{}\"

# Time zone the handoffs happen in:
# timezone = \"America/New_York\"

# Fill and distribution ledger:
# database_path = \"{}\"

# Where reminder events are written (defaults to custody_dir):
# reminder_dir = \"~/calendar/reminders\"
# reminder_tag = \"{}\"

# Refill allowed once this percent of the supply has elapsed:
# refill_threshold_percent = {}

# Longest stretch of tracked-parent days expected in the schedule:
# horizon_days = {}

# Days covered by one distribution:
# planning_period_days = {}

# server_port = {}
",
            DEFAULT_CUSTODY_DIR,
            DEFAULT_CUSTODY_LABEL,
            DEFAULT_DATABASE_PATH,
            DEFAULT_REMINDER_TAG,
            DEFAULT_REFILL_THRESHOLD_PERCENT,
            DEFAULT_HORIZON_DAYS,
            DEFAULT_PLANNING_PERIOD_DAYS,
            DEFAULT_SERVER_PORT,
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PillError::Config(format!("Could not create config directory: {e}")))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| PillError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// The effective configuration as TOML.
    pub fn to_toml(&self) -> PillResult<String> {
        toml::to_string_pretty(self).map_err(|e| PillError::Serialization(e.to_string()))
    }

    pub fn custody_dir(&self) -> PillResult<PathBuf> {
        expand(&self.custody_dir)
    }

    pub fn reminder_dir(&self) -> PillResult<PathBuf> {
        match &self.reminder_dir {
            Some(dir) => expand(dir),
            None => self.custody_dir(),
        }
    }

    pub fn database_path(&self) -> PillResult<PathBuf> {
        expand(&self.database_path)
    }

    pub fn timezone(&self) -> PillResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| PillError::Config(format!("Unknown time zone '{}'", self.timezone)))
    }

    pub fn planner(&self) -> DistributionPlanner {
        DistributionPlanner::new(self.refill_threshold_percent)
    }

    /// Current date where the handoffs happen.
    pub fn today(&self) -> PillResult<NaiveDate> {
        Ok(Utc::now().with_timezone(&self.timezone()?).date_naive())
    }
}

/// Expand `~` and `$VARS` in a configured path.
fn expand(path: &Path) -> PillResult<PathBuf> {
    let expanded = shellexpand::full(&path.to_string_lossy())
        .map_err(|e| PillError::Config(format!("Could not expand path {}: {}", path.display(), e)))?
        .into_owned();

    Ok(PathBuf::from(expanded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PillConfig::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.custody_label, "Custody");
        assert_eq!(config.refill_threshold_percent, 85);
        assert_eq!(config.horizon_days, 14);
        assert_eq!(config.planning_period_days, 30);
        assert_eq!(config.reminder_tag, "[PILLS]");
        assert_eq!(config.server_port, 5001);
    }

    #[test]
    fn test_default_file_is_all_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        PillConfig::create_default_config(&path).unwrap();
        let config = PillConfig::load_from(&path).unwrap();

        assert_eq!(config.custody_dir, PathBuf::from(DEFAULT_CUSTODY_DIR));
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
    }

    #[test]
    fn test_file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "custody_dir = \"/tmp/custody\"\ncustody_label = \"Dad\"\ntimezone = \"America/Chicago\"\nrefill_threshold_percent = 80\n",
        )
        .unwrap();

        let config = PillConfig::load_from(&path).unwrap();

        assert_eq!(config.custody_dir().unwrap(), PathBuf::from("/tmp/custody"));
        assert_eq!(config.custody_label, "Dad");
        assert_eq!(config.timezone().unwrap(), chrono_tz::America::Chicago);
        assert_eq!(config.planner().refill_threshold_percent(), 80);
        // Reminders go next to the custody blocks unless configured
        assert_eq!(config.reminder_dir().unwrap(), PathBuf::from("/tmp/custody"));
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timezone = \"Mars/Olympus\"\n").unwrap();

        let err = PillConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, PillError::Config(_)));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refill_threshold_percent = 120\n").unwrap();

        assert!(PillConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_toml_round_trip_keeps_values() {
        let config = PillConfig {
            reminder_dir: Some(PathBuf::from("/tmp/reminders")),
            ..PillConfig::default()
        };
        let text = config.to_toml().unwrap();
        assert!(text.contains("reminder_dir = \"/tmp/reminders\""));

        let parsed: PillConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
