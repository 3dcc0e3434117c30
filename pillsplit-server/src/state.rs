use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pillsplit_core::{CalendarDirSource, PillConfig, PillManager, PillResult, SqliteLedger};

pub type Manager = PillManager<SqliteLedger, CalendarDirSource>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    // Each request opens its own ledger connection; only the config is shared
    config: Arc<PillConfig>,
}

impl AppState {
    pub fn new(config: PillConfig) -> Result<Self> {
        // Fail at startup rather than on the first request
        PillManager::from_config(&config).context("Failed to open the ledger")?;

        Ok(AppState {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &PillConfig {
        &self.config
    }

    pub fn manager(&self) -> PillResult<Manager> {
        PillManager::from_config(&self.config)
    }

    pub fn today(&self) -> PillResult<NaiveDate> {
        self.config.today()
    }
}
