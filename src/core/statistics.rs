use crate::db::stats::{category_stats, completed_count, total_hours};
use crate::db::time_blocks::{block_dates, blocks_for_date};
use crate::errors::AppResult;
use crate::models::{StatisticsData, TodayStats};
use crate::utils::date::{months_before, weeks_before, years_before};
use chrono::NaiveDate;
use rusqlite::Connection;

/// Aggregates over stored blocks. Every call scans the requested range.
pub struct StatisticsLogic;

impl StatisticsLogic {
    pub fn for_range(conn: &Connection, from: NaiveDate, to: NaiveDate) -> AppResult<StatisticsData> {
        Ok(StatisticsData {
            total_hours: total_hours(conn, from, to)?,
            completed_blocks: completed_count(conn, from, to)?,
            category_stats: category_stats(conn, from, to)?,
        })
    }

    /// `today - 1 week ..= today`
    pub fn weekly(conn: &Connection, today: NaiveDate) -> AppResult<StatisticsData> {
        Self::for_range(conn, weeks_before(today, 1), today)
    }

    pub fn monthly(conn: &Connection, today: NaiveDate) -> AppResult<StatisticsData> {
        Self::for_range(conn, months_before(today, 1), today)
    }

    pub fn yearly(conn: &Connection, today: NaiveDate) -> AppResult<StatisticsData> {
        Self::for_range(conn, years_before(today, 1), today)
    }

    pub fn today(conn: &Connection, today: NaiveDate) -> AppResult<TodayStats> {
        let blocks = blocks_for_date(conn, today)?;
        let total_blocks = blocks.len() as i64;
        let completed_blocks = blocks.iter().filter(|b| b.is_completed).count() as i64;
        let total_minutes = blocks.iter().filter_map(|b| b.actual_duration()).sum();

        let completion_rate = if total_blocks > 0 {
            completed_blocks * 100 / total_blocks
        } else {
            0
        };

        Ok(TodayStats {
            total_blocks,
            completed_blocks,
            total_minutes,
            completion_rate,
        })
    }

    /// Consecutive days ending at `today` with at least one block.
    /// A day without blocks today means no streak.
    pub fn current_streak(conn: &Connection, today: NaiveDate) -> AppResult<u32> {
        let dates = block_dates(conn)?;
        let mut streak = 0;
        let mut day = today;

        for d in dates.iter().rev().skip_while(|d| **d > today) {
            if *d != day {
                break;
            }
            streak += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        Ok(streak)
    }

    /// Longest run of consecutive dates having blocks.
    pub fn max_streak(conn: &Connection) -> AppResult<u32> {
        Ok(longest_run(&block_dates(conn)?))
    }
}

/// `dates` must be sorted ascending and distinct.
fn longest_run(dates: &[NaiveDate]) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for d in dates {
        run = match prev {
            Some(p) if p.succ_opt() == Some(*d) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(*d);
    }
    best
}
