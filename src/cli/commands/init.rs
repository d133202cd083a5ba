use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::achievements::AchievementLogic;
use crate::core::categories::CategoryLogic;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory and file (skipped in test mode)
///  - the SQLite database with all migrations
///  - the built-in categories and the achievement catalogue
pub fn handle(cli: &Cli) -> AppResult<()> {
    let mut cfg = Config::init_all(cli.db.clone(), cli.test)?;
    if let Some(remote) = &cli.remote {
        cfg.remote_dir = remote.clone();
    }

    println!("⚙️  Initializing TimeBlocks…");

    let mut pool = DbPool::new(&cfg.database)?;
    let categories = CategoryLogic::seed_defaults(&mut pool)?;
    let achievements = AchievementLogic::seed(&mut pool)?;

    println!("✅ Database initialized at {}", &cfg.database);
    if categories > 0 {
        println!("🏷️  {categories} default categories created");
    }
    if achievements > 0 {
        println!("🏆 {achievements} achievements available");
    }

    ttlog_quiet(
        &pool.conn,
        "init",
        "Database initialized",
        &format!("Database initialized at {}", &cfg.database),
    );

    println!("🎉 TimeBlocks initialization completed!");
    Ok(())
}
