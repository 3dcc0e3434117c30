mod commands;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pillsplit_core::PillConfig;

#[derive(Parser)]
#[command(name = "pillsplit")]
#[command(about = "Plan medication handoffs between co-parents from the custody calendar")]
struct Cli {
    /// Read configuration from this file instead of ~/.config/pillsplit/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Supply status and the next handoff
    Status,
    /// Which parent gives the pill on each day
    Days {
        /// First day (YYYY-MM-DD, default today)
        #[arg(long)]
        from: Option<String>,

        /// Last day (YYYY-MM-DD, default two weeks after --from)
        #[arg(long)]
        to: Option<String>,
    },
    /// Next day the other parent gives the pill
    NextDay {
        /// Search strictly after this day (YYYY-MM-DD, default today)
        after: Option<String>,
    },
    /// Record or correct a prescription fill
    Fill {
        #[command(subcommand)]
        action: FillAction,
    },
    /// Record pills handed to the other parent
    Give {
        /// Pills handed over (default: the planned quantity)
        quantity: Option<u32>,

        /// Day of the handoff (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,

        /// Fill the pills came from (default: latest fill)
        #[arg(long)]
        fill: Option<i64>,

        #[arg(long)]
        notes: Option<String>,

        /// Correct an existing distribution instead of adding one
        #[arg(long)]
        edit: Option<i64>,
    },
    /// Recent fills and distributions
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
    /// Write reminder events for the current plan
    Sync,
    /// Show or create the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum FillAction {
    /// Record a new fill
    Add {
        /// Pills in the fill (one per day of supply)
        quantity: u32,

        /// Day the prescription was filled (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        pharmacy: Option<String>,

        /// Prescription number
        #[arg(long)]
        rx: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },
    /// Change fields of an existing fill
    Edit {
        id: i64,

        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        quantity: Option<u32>,

        #[arg(long)]
        pharmacy: Option<String>,

        #[arg(long)]
        rx: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the config file location
    Path,
    /// Write a commented default config file if none exists
    Init,
    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    pillsplit_core::telemetry::init_tracing("warn");

    let cli = Cli::parse();

    if let Commands::Config { action } = cli.command {
        return commands::config::run(action, cli.config.as_deref());
    }

    let config = load_config(cli.config.as_deref())?;
    let today = config.today()?;

    match cli.command {
        Commands::Status => commands::status::run(&config, today, cli.json),
        Commands::Days { from, to } => {
            commands::days::run(&config, from.as_deref(), to.as_deref(), today, cli.json)
        }
        Commands::NextDay { after } => {
            commands::days::next_day(&config, after.as_deref(), today, cli.json)
        }
        Commands::Fill { action } => commands::fill::run(&config, action, today, cli.json),
        Commands::Give {
            quantity,
            date,
            fill,
            notes,
            edit,
        } => commands::give::run(
            &config,
            commands::give::GiveArgs {
                quantity,
                date,
                fill,
                notes,
                edit,
            },
            today,
            cli.json,
        ),
        Commands::History { limit } => commands::history::run(&config, limit, cli.json),
        Commands::Sync => commands::sync::run(&config, today, cli.json),
        Commands::Config { .. } => unreachable!("handled above"),
    }
}

fn load_config(path: Option<&Path>) -> Result<PillConfig> {
    match path {
        Some(path) => PillConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => PillConfig::load().context("Failed to load config"),
    }
}
