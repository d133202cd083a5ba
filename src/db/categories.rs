//! `categories` table access.

use crate::db::outbox::{self, Entity, SyncOp};
use crate::db::pool::DbPool;
use crate::db::watch::{LiveQuery, Table};
use crate::errors::{AppError, AppResult};
use crate::models::Category;
use crate::models::category::default_categories;
use rusqlite::{Connection, OptionalExtension, Row, params};

const SELECT: &str = "SELECT id, name, color, icon, is_default, sort_order FROM categories";

pub fn map_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        is_default: row.get("is_default")?,
        order: row.get("sort_order")?,
    })
}

pub(crate) fn write_row(conn: &Connection, c: &Category) -> AppResult<()> {
    conn.execute(
        "INSERT INTO categories (id, name, color, icon, is_default, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name, color = excluded.color, icon = excluded.icon,
             is_default = excluded.is_default, sort_order = excluded.sort_order",
        params![c.id, c.name, c.color, c.icon, c.is_default, c.order],
    )?;
    Ok(())
}

pub fn insert_category(pool: &mut DbPool, c: &Category) -> AppResult<()> {
    pool.write(Table::Categories, |tx| {
        write_row(tx, c)?;
        outbox::enqueue(tx, Entity::Category, &c.id, SyncOp::Upsert)
    })
}

pub fn update_category(pool: &mut DbPool, c: &Category) -> AppResult<()> {
    pool.write(Table::Categories, |tx| {
        if get_category(tx, &c.id)?.is_none() {
            return Err(AppError::not_found("Category", &c.id));
        }
        write_row(tx, c)?;
        outbox::enqueue(tx, Entity::Category, &c.id, SyncOp::Upsert)
    })
}

pub fn delete_category(pool: &mut DbPool, id: &str) -> AppResult<()> {
    pool.write(Table::Categories, |tx| {
        let n = tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(AppError::not_found("Category", id));
        }
        outbox::enqueue(tx, Entity::Category, id, SyncOp::Delete)
    })
}

/// Insert the built-in categories that are missing. Returns how many were added.
pub fn seed_defaults(pool: &mut DbPool) -> AppResult<usize> {
    pool.write(Table::Categories, |tx| {
        let mut added = 0;
        for c in default_categories() {
            let n = tx.execute(
                "INSERT OR IGNORE INTO categories (id, name, color, icon, is_default, sort_order)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5)",
                params![c.id, c.name, c.color, c.icon, c.order],
            )?;
            if n > 0 {
                outbox::enqueue(tx, Entity::Category, &c.id, SyncOp::Upsert)?;
                added += n;
            }
        }
        Ok(added)
    })
}

pub fn get_category(conn: &Connection, id: &str) -> AppResult<Option<Category>> {
    let sql = format!("{SELECT} WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([id], map_row).optional()?)
}

/// Case-insensitive lookup by display name.
pub fn find_by_name(conn: &Connection, name: &str) -> AppResult<Option<Category>> {
    let sql = format!("{SELECT} WHERE lower(name) = lower(?1) LIMIT 1");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([name.trim()], map_row).optional()?)
}

/// All categories by display order.
pub fn list_categories(conn: &Connection) -> AppResult<Vec<Category>> {
    let sql = format!("{SELECT} ORDER BY sort_order ASC, name ASC");
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Every stored category, built-in ones included; this is what the tier
/// cap is compared with.
pub fn count_categories(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM categories",
        [],
        |row| row.get(0),
    )?)
}

pub fn next_order(conn: &Connection) -> AppResult<i32> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM categories",
        [],
        |row| row.get(0),
    )?)
}

pub fn watch_categories(pool: &DbPool) -> LiveQuery<Vec<Category>> {
    pool.watch(Table::Categories, list_categories)
}
