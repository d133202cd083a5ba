//! `user_settings` table access (one row per signed-in user).

use crate::db::outbox::{self, Entity, SyncOp};
use crate::db::pool::DbPool;
use crate::db::watch::{LiveQuery, Table};
use crate::errors::{AppError, AppResult};
use crate::models::user::MAX_CATEGORIES_FREE;
use crate::models::{Theme, UserSettings};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

pub fn map_row(row: &Row) -> rusqlite::Result<UserSettings> {
    let theme: String = row.get("theme")?;
    Ok(UserSettings {
        user_id: row.get("user_id")?,
        theme: Theme::from_db_str(&theme).map_err(|e| e.into_sql(1))?,
        language: row.get("language")?,
        notifications_enabled: row.get("notifications_enabled")?,
        is_premium: row.get("is_premium")?,
        max_categories: row.get("max_categories")?,
        last_sync_time: row.get("last_sync_time")?,
    })
}

pub(crate) fn write_row(conn: &Connection, s: &UserSettings) -> AppResult<()> {
    conn.execute(
        "INSERT INTO user_settings
             (user_id, theme, language, notifications_enabled, is_premium, max_categories, last_sync_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id) DO UPDATE SET
             theme = excluded.theme, language = excluded.language,
             notifications_enabled = excluded.notifications_enabled,
             is_premium = excluded.is_premium, max_categories = excluded.max_categories,
             last_sync_time = excluded.last_sync_time",
        params![
            s.user_id,
            s.theme.to_db_str(),
            s.language,
            s.notifications_enabled,
            s.is_premium,
            s.max_categories,
            s.last_sync_time,
        ],
    )?;
    Ok(())
}

/// Create the default row unless one exists. Returns `true` when created.
pub fn initialize(pool: &mut DbPool, user_id: &str, language: &str) -> AppResult<bool> {
    pool.write(Table::UserSettings, |tx| {
        let n = tx.execute(
            "INSERT OR IGNORE INTO user_settings (user_id, language, max_categories)
             VALUES (?1, ?2, ?3)",
            params![user_id, language, MAX_CATEGORIES_FREE],
        )?;
        if n > 0 {
            outbox::enqueue(tx, Entity::User, user_id, SyncOp::Upsert)?;
        }
        Ok(n > 0)
    })
}

pub fn get_settings(conn: &Connection, user_id: &str) -> AppResult<Option<UserSettings>> {
    let mut stmt = conn.prepare_cached(
        "SELECT user_id, theme, language, notifications_enabled, is_premium,
                max_categories, last_sync_time
         FROM user_settings WHERE user_id = ?1",
    )?;
    Ok(stmt.query_row([user_id], map_row).optional()?)
}

/// Run a single-row update and queue the change; missing rows are `NotFound`.
fn update<F>(pool: &mut DbPool, user_id: &str, func: F) -> AppResult<()>
where
    F: FnOnce(&Transaction) -> rusqlite::Result<usize>,
{
    pool.write(Table::UserSettings, |tx| {
        if func(tx)? == 0 {
            return Err(AppError::not_found("User settings", user_id));
        }
        outbox::enqueue(tx, Entity::User, user_id, SyncOp::Upsert)
    })
}

pub fn update_theme(pool: &mut DbPool, user_id: &str, theme: Theme) -> AppResult<()> {
    update(pool, user_id, |tx| {
        tx.execute(
            "UPDATE user_settings SET theme = ?2 WHERE user_id = ?1",
            params![user_id, theme.to_db_str()],
        )
    })
}

pub fn update_language(pool: &mut DbPool, user_id: &str, language: &str) -> AppResult<()> {
    update(pool, user_id, |tx| {
        tx.execute(
            "UPDATE user_settings SET language = ?2 WHERE user_id = ?1",
            params![user_id, language],
        )
    })
}

pub fn update_notifications(pool: &mut DbPool, user_id: &str, enabled: bool) -> AppResult<()> {
    update(pool, user_id, |tx| {
        tx.execute(
            "UPDATE user_settings SET notifications_enabled = ?2 WHERE user_id = ?1",
            params![user_id, enabled],
        )
    })
}

/// Premium flag and category cap always move together.
pub fn update_premium(
    pool: &mut DbPool,
    user_id: &str,
    is_premium: bool,
    max_categories: i32,
) -> AppResult<()> {
    update(pool, user_id, |tx| {
        tx.execute(
            "UPDATE user_settings SET is_premium = ?2, max_categories = ?3 WHERE user_id = ?1",
            params![user_id, is_premium, max_categories],
        )
    })
}

pub fn update_max_categories(pool: &mut DbPool, user_id: &str, max: i32) -> AppResult<()> {
    update(pool, user_id, |tx| {
        tx.execute(
            "UPDATE user_settings SET max_categories = ?2 WHERE user_id = ?1",
            params![user_id, max],
        )
    })
}

/// Bookkeeping only: not queued for sync.
pub fn update_last_sync(pool: &mut DbPool, user_id: &str, at: i64) -> AppResult<()> {
    pool.write(Table::UserSettings, |tx| {
        tx.execute(
            "UPDATE user_settings SET last_sync_time = ?2 WHERE user_id = ?1",
            params![user_id, at],
        )?;
        Ok(())
    })
}

pub fn delete_settings(pool: &mut DbPool, user_id: &str) -> AppResult<()> {
    pool.write(Table::UserSettings, |tx| {
        let n = tx.execute("DELETE FROM user_settings WHERE user_id = ?1", [user_id])?;
        if n == 0 {
            return Err(AppError::not_found("User settings", user_id));
        }
        outbox::enqueue(tx, Entity::User, user_id, SyncOp::Delete)
    })
}

pub fn watch_settings(pool: &DbPool, user_id: &str) -> LiveQuery<Option<UserSettings>> {
    let user_id = user_id.to_string();
    pool.watch(Table::UserSettings, move |conn| get_settings(conn, &user_id))
}
