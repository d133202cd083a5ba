use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::backup::BackupLogic;
use crate::errors::AppResult;

use super::open_pool;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Backup {
        file,
        compress,
        force,
    } = cmd
    {
        let pool = open_pool(cfg)?;
        BackupLogic::backup(&pool, &cfg.database, file, *compress, *force)?;
    }

    Ok(())
}
