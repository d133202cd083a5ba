//! Aggregate queries over `time_blocks` and database file statistics.

use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::CategoryStat;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use crate::utils::date::date_to_db;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::fs;

// Whole seconds between the two actual timestamps of a row.
const ACTUAL_SECONDS: &str = "(CAST(strftime('%s', actual_end_time) AS INTEGER)
     - CAST(strftime('%s', actual_start_time) AS INTEGER))";

/// Hours actually spent in `from..=to`. Rows missing either actual
/// timestamp contribute nothing.
pub fn total_hours(conn: &Connection, from: NaiveDate, to: NaiveDate) -> AppResult<f64> {
    let sql = format!(
        "SELECT COALESCE(SUM({ACTUAL_SECONDS}), 0) FROM time_blocks
         WHERE date BETWEEN ?1 AND ?2
           AND actual_start_time IS NOT NULL AND actual_end_time IS NOT NULL"
    );
    let secs: i64 = conn.query_row(&sql, [date_to_db(from), date_to_db(to)], |row| row.get(0))?;
    Ok(secs as f64 / 3600.0)
}

pub fn completed_count(conn: &Connection, from: NaiveDate, to: NaiveDate) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM time_blocks WHERE date BETWEEN ?1 AND ?2 AND is_completed = 1",
        [date_to_db(from), date_to_db(to)],
        |row| row.get(0),
    )?)
}

/// Block count and actual minutes per category, busiest first.
pub fn category_stats(conn: &Connection, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<CategoryStat>> {
    let sql = format!(
        "SELECT category_id,
                COUNT(*),
                COALESCE(SUM(CASE WHEN actual_start_time IS NOT NULL AND actual_end_time IS NOT NULL
                                  THEN {ACTUAL_SECONDS} ELSE 0 END), 0)
         FROM time_blocks
         WHERE date BETWEEN ?1 AND ?2
         GROUP BY category_id
         ORDER BY 3 DESC, category_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([date_to_db(from), date_to_db(to)], |row| {
        let secs: i64 = row.get(2)?;
        Ok(CategoryStat {
            category_id: row.get(0)?,
            count: row.get(1)?,
            total_minutes: secs as f64 / 60.0,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Snapshot printed by `db --info`.
#[derive(Debug, Clone)]
pub struct DbInfo {
    pub file_size: u64,
    pub time_blocks: i64,
    pub categories: i64,
    pub achievements_unlocked: i64,
    pub pending_sync: i64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

fn count(conn: &Connection, sql: &str) -> AppResult<i64> {
    Ok(conn.query_row(sql, [], |row| row.get(0))?)
}

pub fn collect_db_info(pool: &DbPool, db_path: &str) -> AppResult<DbInfo> {
    let conn = &pool.conn;
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    let first_date: Option<String> = conn
        .query_row("SELECT MIN(date) FROM time_blocks", [], |row| row.get(0))
        .optional()?
        .flatten();
    let last_date: Option<String> = conn
        .query_row("SELECT MAX(date) FROM time_blocks", [], |row| row.get(0))
        .optional()?
        .flatten();

    Ok(DbInfo {
        file_size,
        time_blocks: count(conn, "SELECT COUNT(*) FROM time_blocks")?,
        categories: count(conn, "SELECT COUNT(*) FROM categories")?,
        achievements_unlocked: count(conn, "SELECT COUNT(*) FROM achievements WHERE is_unlocked = 1")?,
        pending_sync: count(conn, "SELECT COUNT(*) FROM sync_outbox")?,
        first_date,
        last_date,
    })
}

pub fn print_db_info(pool: &DbPool, db_path: &str) -> AppResult<()> {
    let info = collect_db_info(pool, db_path)?;
    println!();

    //
    // 1) FILE
    //
    let file_mb = (info.file_size as f64) / (1024.0 * 1024.0);
    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) ROW COUNTS
    //
    println!("{}• Time blocks:{} {}{}{}", CYAN, RESET, GREEN, info.time_blocks, RESET);
    println!("{}• Categories:{} {}{}{}", CYAN, RESET, GREEN, info.categories, RESET);
    println!(
        "{}• Achievements unlocked:{} {}{}{}",
        CYAN, RESET, GREEN, info.achievements_unlocked, RESET
    );
    println!("{}• Pending sync:{} {}", CYAN, RESET, info.pending_sync);

    //
    // 3) DATE RANGE
    //
    let dash = || format!("{GREY}--{RESET}");
    println!("{}• Date range:{}", CYAN, RESET);
    println!("    from: {}", info.first_date.clone().unwrap_or_else(dash));
    println!("    to:   {}", info.last_date.clone().unwrap_or_else(dash));

    //
    // 4) AVERAGE BLOCKS/DAY
    //
    if let (Some(f), Some(l)) = (&info.first_date, &info.last_date)
        && let (Some(d1), Some(d2)) = (
            crate::utils::date::parse_date(f),
            crate::utils::date::parse_date(l),
        )
    {
        let days = (d2 - d1).num_days() + 1;
        let avg = info.time_blocks as f64 / days as f64;
        println!("{}• Average blocks/day:{} {:.2}", CYAN, RESET, avg);
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::time_blocks::insert_block;
    use crate::models::TimeBlock;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn done(pool: &mut DbPool, cat: &str, day: u32, s: NaiveTime, e: NaiveTime) {
        let mut b = TimeBlock::new("x", None, s, e, cat, d(day));
        b.actual_start_time = Some(s);
        b.actual_end_time = Some(e);
        b.is_completed = true;
        insert_block(pool, &b).unwrap();
    }

    #[test]
    fn empty_range_has_zero_hours() {
        let pool = DbPool::open_in_memory().unwrap();
        assert_eq!(total_hours(&pool.conn, d(1), d(30)).unwrap(), 0.0);
        assert_eq!(completed_count(&pool.conn, d(1), d(30)).unwrap(), 0);
        assert!(category_stats(&pool.conn, d(1), d(30)).unwrap().is_empty());
    }

    #[test]
    fn sums_actual_durations_and_skips_unfinished() {
        let mut pool = DbPool::open_in_memory().unwrap();
        done(&mut pool, "cat_work", 2, t(9, 0), t(10, 30));
        done(&mut pool, "cat_sport", 3, t(18, 0), t(18, 45));

        let mut open = TimeBlock::new("open", None, t(11, 0), t(12, 0), "cat_work", d(3));
        open.actual_start_time = Some(t(11, 0));
        insert_block(&mut pool, &open).unwrap();

        assert_eq!(total_hours(&pool.conn, d(1), d(30)).unwrap(), 2.25);
        assert_eq!(total_hours(&pool.conn, d(3), d(3)).unwrap(), 0.75);
        assert_eq!(completed_count(&pool.conn, d(1), d(30)).unwrap(), 2);

        let stats = category_stats(&pool.conn, d(1), d(30)).unwrap();
        assert_eq!(stats[0].category_id, "cat_work");
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].total_minutes, 90.0);
        assert_eq!(stats[1].total_minutes, 45.0);
    }
}
