use anyhow::Result;
use chrono::NaiveDate;
use pillsplit_core::PillConfig;

use super::{open_manager, print_json};
use crate::render::Render;

pub fn run(config: &PillConfig, today: NaiveDate, json: bool) -> Result<()> {
    let manager = open_manager(config)?;
    let overview = manager.overview(today)?;

    if json {
        return print_json(&overview);
    }

    println!("{}", overview.render());
    Ok(())
}
