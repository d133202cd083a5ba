//! TimeBlocks library root.
//! Exposes CLI parser, high-level run() function, and internal modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod remote;
pub mod ui;
pub mod utils;

use cli::commands;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => commands::init::handle(cli),
        Commands::Config { .. } => commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => commands::log::handle(&cli.command, cfg),
        Commands::Backup { .. } => commands::backup::handle(&cli.command, cfg),
        Commands::Block { .. } => commands::block::handle(&cli.command, cfg),
        Commands::Category { .. } => commands::category::handle(&cli.command, cfg),
        Commands::Achievement { .. } => commands::achievement::handle(&cli.command, cfg),
        Commands::Stats { .. } => commands::stats::handle(&cli.command, cfg),
        Commands::Settings { .. } => commands::settings::handle(&cli.command, cfg),
        Commands::Auth { .. } => commands::auth::handle(&cli.command, cfg),
        Commands::Sync { .. } => commands::sync::handle(&cli.command, cfg),
        Commands::Jobs { .. } => commands::jobs::handle(&cli.command, cfg),
    }
}

/// Load the config once and apply the command-line overrides.
pub fn resolve_config(cli: &Cli) -> AppResult<Config> {
    let mut cfg = Config::load()?;

    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    if let Some(remote) = &cli.remote {
        cfg.remote_dir = remote.clone();
    }

    Ok(cfg)
}

/// Entry point used by main.rs, with the arguments already parsed.
pub fn run(cli: &Cli) -> AppResult<()> {
    let cfg = resolve_config(cli)?;
    tracing::debug!(db = %cfg.database, remote = %cfg.remote_dir, "configuration resolved");
    dispatch(cli, &cfg)
}
