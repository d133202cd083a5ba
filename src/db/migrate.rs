//! Schema migrations.
//!
//! Every migration has a version tag; once applied it is recorded in the
//! `log` table as `migration_applied` with the tag as target, so running the
//! engine again is a no-op.

use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension};

struct Migration {
    version: &'static str,
    message: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20250301_0001_create_core_tables",
        message: "Created time_blocks, categories, achievements and user_settings",
        sql: r#"
        CREATE TABLE IF NOT EXISTS categories (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            color       TEXT NOT NULL,
            icon        TEXT NOT NULL DEFAULT '',
            is_default  INTEGER NOT NULL DEFAULT 0,
            sort_order  INTEGER NOT NULL DEFAULT 0
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_name ON categories(name);

        CREATE TABLE IF NOT EXISTS time_blocks (
            id                 TEXT PRIMARY KEY,
            title              TEXT NOT NULL,
            description        TEXT,
            start_time         TEXT NOT NULL,
            end_time           TEXT NOT NULL,
            category_id        TEXT NOT NULL,
            date               TEXT NOT NULL,
            is_completed       INTEGER NOT NULL DEFAULT 0,
            actual_start_time  TEXT,
            actual_end_time    TEXT,
            created_at         INTEGER NOT NULL,
            updated_at         INTEGER NOT NULL,
            CHECK (start_time < end_time)
        );
        CREATE INDEX IF NOT EXISTS idx_time_blocks_date_start ON time_blocks(date, start_time);
        CREATE INDEX IF NOT EXISTS idx_time_blocks_category ON time_blocks(category_id);

        CREATE TABLE IF NOT EXISTS achievements (
            id            TEXT PRIMARY KEY,
            kind          TEXT NOT NULL,
            title         TEXT NOT NULL,
            description   TEXT NOT NULL DEFAULT '',
            rarity        TEXT NOT NULL,
            is_unlocked   INTEGER NOT NULL DEFAULT 0,
            progress      INTEGER NOT NULL DEFAULT 0,
            max_progress  INTEGER NOT NULL DEFAULT 100,
            unlocked_at   INTEGER,
            CHECK (progress >= 0 AND progress <= max_progress)
        );

        CREATE TABLE IF NOT EXISTS user_settings (
            user_id                TEXT PRIMARY KEY,
            theme                  TEXT NOT NULL DEFAULT 'system',
            language               TEXT NOT NULL DEFAULT 'en',
            notifications_enabled  INTEGER NOT NULL DEFAULT 1,
            is_premium             INTEGER NOT NULL DEFAULT 0,
            max_categories         INTEGER NOT NULL DEFAULT 3,
            last_sync_time         INTEGER
        );
        "#,
    },
    Migration {
        version: "20250315_0002_one_way_unlock",
        message: "Added trigger keeping achievement unlocks one-way",
        sql: r#"
        CREATE TRIGGER IF NOT EXISTS trg_achievements_unlock_one_way
        BEFORE UPDATE OF is_unlocked ON achievements
        WHEN OLD.is_unlocked = 1 AND NEW.is_unlocked = 0
        BEGIN
            SELECT RAISE(ABORT, 'achievement unlock is one-way');
        END;
        "#,
    },
    Migration {
        version: "20250402_0003_create_sync_outbox",
        message: "Created sync_outbox for incremental remote sync",
        sql: r#"
        CREATE TABLE IF NOT EXISTS sync_outbox (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            entity     TEXT NOT NULL CHECK(entity IN ('time_block','category','achievement','user')),
            record_id  TEXT NOT NULL,
            op         TEXT NOT NULL CHECK(op IN ('upsert','delete')),
            queued_at  INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sync_outbox_record ON sync_outbox(entity, record_id);
        "#,
    },
    Migration {
        version: "20250420_0004_create_jobs",
        message: "Created jobs table for background work",
        sql: r#"
        CREATE TABLE IF NOT EXISTS jobs (
            name                      TEXT PRIMARY KEY,
            kind                      TEXT NOT NULL,
            interval_ms               INTEGER,
            next_run_at               INTEGER NOT NULL,
            requires_network          INTEGER NOT NULL DEFAULT 0,
            requires_battery_not_low  INTEGER NOT NULL DEFAULT 0,
            status                    TEXT NOT NULL DEFAULT 'enqueued',
            attempts                  INTEGER NOT NULL DEFAULT 0,
            last_run_at               INTEGER,
            last_error                TEXT
        );
        "#,
    },
];

/// Ensure that the `log` table exists: it is the migration ledger too.
fn ensure_log_table(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> AppResult<bool> {
    let mut chk = conn.prepare_cached(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(m.sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;

    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [m.version, m.message],
    )?;

    tx.commit()?;
    tracing::info!(version = m.version, "migration applied");
    Ok(())
}

/// Versions not applied yet, in order.
pub fn pending_migrations(conn: &Connection) -> AppResult<Vec<&'static str>> {
    ensure_log_table(conn)?;
    let mut out = Vec::new();
    for m in MIGRATIONS {
        if !is_applied(conn, m.version)? {
            out.push(m.version);
        }
    }
    Ok(out)
}

/// Public entry point: run all pending migrations, returning how many ran.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<usize> {
    ensure_log_table(conn)?;

    let mut applied = 0;
    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }
        apply(conn, m)?;
        applied += 1;
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_pending_migrations(&conn).unwrap(), MIGRATIONS.len());
        assert_eq!(run_pending_migrations(&conn).unwrap(), 0);
        assert!(pending_migrations(&conn).unwrap().is_empty());
    }

    #[test]
    fn unlock_trigger_blocks_relock() {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO achievements (id, kind, title, rarity, is_unlocked, progress, max_progress)
             VALUES ('a', 'streak', 'A', 'common', 1, 3, 3)",
            [],
        )
        .unwrap();

        let res = conn.execute("UPDATE achievements SET is_unlocked = 0 WHERE id = 'a'", []);
        assert!(res.is_err());
    }
}
