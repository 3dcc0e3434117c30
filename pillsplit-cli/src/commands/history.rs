use anyhow::Result;
use owo_colors::OwoColorize;
use pillsplit_core::PillConfig;

use super::{open_manager, print_json};
use crate::render::Render;

pub fn run(config: &PillConfig, limit: u32, json: bool) -> Result<()> {
    let manager = open_manager(config)?;
    let history = manager.history(limit)?;

    if json {
        return print_json(&history);
    }

    println!("{}", "Fills".bold());
    if history.fills.is_empty() {
        println!("   {}", "None recorded".dimmed());
    }
    for fill in &history.fills {
        println!("   {}", fill.render());
    }

    println!();
    println!("{}", "Distributions".bold());
    if history.distributions.is_empty() {
        println!("   {}", "None recorded".dimmed());
    }
    for distribution in &history.distributions {
        println!("   {}", distribution.render());
    }

    Ok(())
}
