//! `time_blocks` table access.

use crate::db::outbox::{self, Entity, SyncOp};
use crate::db::pool::DbPool;
use crate::db::watch::{LiveQuery, Table};
use crate::errors::{AppError, AppResult};
use crate::models::TimeBlock;
use crate::utils::date::{DATE_FMT, date_to_db};
use crate::utils::time::{parse_time, time_to_db};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Connection, OptionalExtension, Row, params};

const SELECT: &str = "SELECT id, title, description, start_time, end_time, category_id, date,
        is_completed, actual_start_time, actual_end_time, created_at, updated_at
     FROM time_blocks";

fn time_col(row: &Row, idx: usize) -> rusqlite::Result<NaiveTime> {
    let s: String = row.get(idx)?;
    parse_time(&s).ok_or_else(|| AppError::InvalidTime(s).into_sql(idx))
}

fn opt_time_col(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| parse_time(&s).ok_or_else(|| AppError::InvalidTime(s).into_sql(idx)))
        .transpose()
}

pub fn map_row(row: &Row) -> rusqlite::Result<TimeBlock> {
    let date_str: String = row.get(6)?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FMT)
        .map_err(|_| AppError::InvalidDate(date_str.clone()).into_sql(6))?;

    Ok(TimeBlock {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_time: time_col(row, 3)?,
        end_time: time_col(row, 4)?,
        category_id: row.get(5)?,
        date,
        is_completed: row.get(7)?,
        actual_start_time: opt_time_col(row, 8)?,
        actual_end_time: opt_time_col(row, 9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn collect(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> AppResult<Vec<TimeBlock>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(args, map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Insert or overwrite the row without touching the outbox.
pub(crate) fn write_row(conn: &Connection, b: &TimeBlock) -> AppResult<()> {
    conn.execute(
        "INSERT INTO time_blocks (id, title, description, start_time, end_time, category_id, date,
                                  is_completed, actual_start_time, actual_end_time, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title, description = excluded.description,
             start_time = excluded.start_time, end_time = excluded.end_time,
             category_id = excluded.category_id, date = excluded.date,
             is_completed = excluded.is_completed,
             actual_start_time = excluded.actual_start_time,
             actual_end_time = excluded.actual_end_time,
             updated_at = excluded.updated_at",
        params![
            b.id,
            b.title,
            b.description,
            time_to_db(b.start_time),
            time_to_db(b.end_time),
            b.category_id,
            date_to_db(b.date),
            b.is_completed,
            b.actual_start_time.map(time_to_db),
            b.actual_end_time.map(time_to_db),
            b.created_at,
            b.updated_at,
        ],
    )?;
    Ok(())
}

/// Row plus outbox entry, without the achievement check `BlockLogic::create`
/// schedules alongside.
#[cfg(test)]
pub(crate) fn insert_block(pool: &mut DbPool, b: &TimeBlock) -> AppResult<()> {
    pool.write(Table::TimeBlocks, |tx| {
        write_row(tx, b)?;
        outbox::enqueue(tx, Entity::TimeBlock, &b.id, SyncOp::Upsert)
    })
}

/// Update an existing block (all fields except id and created_at).
pub fn update_block(pool: &mut DbPool, b: &TimeBlock) -> AppResult<()> {
    pool.write(Table::TimeBlocks, |tx| {
        if !exists(tx, &b.id)? {
            return Err(AppError::not_found("Time block", &b.id));
        }
        write_row(tx, b)?;
        outbox::enqueue(tx, Entity::TimeBlock, &b.id, SyncOp::Upsert)
    })
}

pub fn delete_block(pool: &mut DbPool, id: &str) -> AppResult<()> {
    pool.write(Table::TimeBlocks, |tx| {
        let n = tx.execute("DELETE FROM time_blocks WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(AppError::not_found("Time block", id));
        }
        outbox::enqueue(tx, Entity::TimeBlock, id, SyncOp::Delete)
    })
}

/// Delete every block of a date, queueing a tombstone for each.
pub fn delete_blocks_for_date(pool: &mut DbPool, date: NaiveDate) -> AppResult<usize> {
    pool.write(Table::TimeBlocks, |tx| {
        let ids: Vec<String> = {
            let mut stmt = tx.prepare("SELECT id FROM time_blocks WHERE date = ?1")?;
            let rows = stmt.query_map([date_to_db(date)], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        tx.execute("DELETE FROM time_blocks WHERE date = ?1", [date_to_db(date)])?;
        for id in &ids {
            outbox::enqueue(tx, Entity::TimeBlock, id, SyncOp::Delete)?;
        }
        Ok(ids.len())
    })
}

pub fn exists(conn: &Connection, id: &str) -> AppResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM time_blocks WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?)
}

/// Ids starting with `prefix`, at most `limit` of them.
pub fn ids_with_prefix(conn: &Connection, prefix: &str, limit: usize) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM time_blocks WHERE substr(id, 1, length(?1)) = ?1 ORDER BY id LIMIT ?2",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![prefix, limit], |row| row.get(0))?;
    Ok(rows.collect::<Result<Vec<String>, _>>()?)
}

pub fn get_block(conn: &Connection, id: &str) -> AppResult<Option<TimeBlock>> {
    let sql = format!("{SELECT} WHERE id = ?1 LIMIT 1");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([id], map_row).optional()?)
}

/// Blocks of one day, by start time.
pub fn blocks_for_date(conn: &Connection, date: NaiveDate) -> AppResult<Vec<TimeBlock>> {
    let sql = format!("{SELECT} WHERE date = ?1 ORDER BY start_time ASC, created_at ASC");
    collect(conn, &sql, [date_to_db(date)])
}

pub fn completed_blocks_for_date(conn: &Connection, date: NaiveDate) -> AppResult<Vec<TimeBlock>> {
    let sql = format!(
        "{SELECT} WHERE date = ?1 AND is_completed = 1 ORDER BY start_time ASC, created_at ASC"
    );
    collect(conn, &sql, [date_to_db(date)])
}

/// Inclusive range, by date then start time.
pub fn blocks_in_range(conn: &Connection, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<TimeBlock>> {
    let sql = format!(
        "{SELECT} WHERE date BETWEEN ?1 AND ?2 ORDER BY date ASC, start_time ASC, created_at ASC"
    );
    collect(conn, &sql, [date_to_db(from), date_to_db(to)])
}

/// Blocks whose planned window contains `time` (bounds inclusive).
pub fn active_blocks(conn: &Connection, date: NaiveDate, time: NaiveTime) -> AppResult<Vec<TimeBlock>> {
    let sql = format!(
        "{SELECT} WHERE date = ?1 AND ?2 BETWEEN start_time AND end_time ORDER BY start_time ASC"
    );
    collect(conn, &sql, [date_to_db(date), time_to_db(time)])
}

/// Distinct dates having at least one block, ascending.
pub fn block_dates(conn: &Connection) -> AppResult<Vec<NaiveDate>> {
    let mut stmt = conn.prepare_cached("SELECT DISTINCT date FROM time_blocks ORDER BY date ASC")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        let s = r?;
        let d = NaiveDate::parse_from_str(&s, DATE_FMT).map_err(|_| AppError::InvalidDate(s))?;
        out.push(d);
    }
    Ok(out)
}

pub fn count_for_category(conn: &Connection, category_id: &str) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM time_blocks WHERE category_id = ?1",
        [category_id],
        |row| row.get(0),
    )?)
}

/// Live view of one day.
pub fn watch_blocks_for_date(pool: &DbPool, date: NaiveDate) -> LiveQuery<Vec<TimeBlock>> {
    pool.watch(Table::TimeBlocks, move |conn| blocks_for_date(conn, date))
}

/// Live view of an inclusive range.
pub fn watch_blocks_in_range(pool: &DbPool, from: NaiveDate, to: NaiveDate) -> LiveQuery<Vec<TimeBlock>> {
    pool.watch(Table::TimeBlocks, move |conn| blocks_in_range(conn, from, to))
}
