use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use pillsplit_core::PillConfig;

use crate::ConfigAction;

pub fn run(action: Option<ConfigAction>, explicit: Option<&Path>) -> Result<()> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => PillConfig::config_path()?,
    };

    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Path => println!("{}", config_path.display()),
        ConfigAction::Init => {
            if config_path.exists() {
                println!("{} {}", "Config already exists:".dimmed(), config_path.display());
            } else {
                PillConfig::create_default_config(&config_path)?;
                println!("{} {}", "Created".green(), config_path.display());
            }
        }
        ConfigAction::Show => {
            let config = PillConfig::load_from(&config_path)?;

            println!("{}", "Paths".bold());
            println!("  Config:     {}", config_path.display());
            println!("  Custody:    {}", config.custody_dir()?.display());
            println!("  Reminders:  {}", config.reminder_dir()?.display());
            println!("  Ledger:     {}", config.database_path()?.display());
            println!();
            println!("{}", "Settings".bold());
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
