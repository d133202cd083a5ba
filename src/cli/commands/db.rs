use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::ttlog_quiet;
use crate::db::migrate::run_pending_migrations;
use crate::db::pool::DbPool;
use crate::db::stats;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, RED, RESET};
use rusqlite::Connection;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Db {
        migrate,
        check,
        vacuum,
        info,
    } = cmd
    {
        // Migrate on a bare connection first: opening the pool would apply
        // everything silently.
        if *migrate {
            println!("{}▶ Running migrations…{}", CYAN, RESET);
            let conn = Connection::open(&cfg.database)?;
            let applied = run_pending_migrations(&conn)?;
            println!(
                "{}✔ Migration completed ({applied} applied).{}\n",
                GREEN, RESET
            );
        }

        let pool = DbPool::new(&cfg.database)?;

        if *info {
            stats::print_db_info(&pool, &cfg.database)?;
        }

        if *check {
            println!("{}▶ Running integrity check…{}", CYAN, RESET);

            let integrity: String = pool
                .conn
                .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;

            if integrity == "ok" {
                println!("{}✔ Integrity check passed.{}\n", GREEN, RESET);
            } else {
                tracing::error!(%integrity, "integrity check failed");
                println!("{}✘ Integrity check failed:{} {}\n", RED, RESET, integrity);
            }
        }

        if *vacuum {
            println!("{}▶ Running VACUUM…{}", CYAN, RESET);
            pool.conn.execute_batch("VACUUM;")?;
            ttlog_quiet(&pool.conn, "vacuum", "", "Database vacuumed");
            println!("{}✔ Vacuum completed.{}\n", GREEN, RESET);
        }
    }

    Ok(())
}
