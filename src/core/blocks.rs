use crate::core::jobs::JobLogic;
use crate::db::categories::get_category;
use crate::db::log::ttlog_quiet;
use crate::db::outbox::{self, Entity, SyncOp};
use crate::db::pool::DbPool;
use crate::db::time_blocks as repo;
use crate::db::watch::Table;
use crate::errors::{AppError, AppResult};
use crate::models::TimeBlock;
use crate::utils::time::{now_millis, time_to_db, truncate_to_minute};
use chrono::{NaiveDate, NaiveTime};

/// Input for [`BlockLogic::create`].
#[derive(Debug, Clone)]
pub struct NewBlock {
    pub title: String,
    pub description: Option<String>,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub category_id: String,
    pub date: NaiveDate,
}

/// Fields `update` may change; `None` keeps the stored value and an empty
/// description clears it.
#[derive(Debug, Clone, Default)]
pub struct BlockChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub category_id: Option<String>,
    pub date: Option<NaiveDate>,
}

/// High-level business logic for time blocks.
pub struct BlockLogic;

fn check_window(start: NaiveTime, end: NaiveTime) -> AppResult<()> {
    if start >= end {
        return Err(AppError::Validation(format!(
            "start time {} must be before end time {}",
            time_to_db(start),
            time_to_db(end)
        )));
    }
    Ok(())
}

fn check_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be blank".into()));
    }
    Ok(())
}

fn check_category(pool: &DbPool, id: &str) -> AppResult<()> {
    if get_category(&pool.conn, id)?.is_none() {
        return Err(AppError::not_found("Category", id));
    }
    Ok(())
}

impl BlockLogic {
    pub fn create(pool: &mut DbPool, new: NewBlock) -> AppResult<TimeBlock> {
        check_title(&new.title)?;
        let start = truncate_to_minute(new.start);
        let end = truncate_to_minute(new.end);
        check_window(start, end)?;
        check_category(pool, &new.category_id)?;

        let block = TimeBlock::new(
            &new.title,
            new.description.as_deref(),
            start,
            end,
            &new.category_id,
            new.date,
        );
        // Row, outbox entry and the delayed check commit together.
        pool.write(Table::TimeBlocks, |tx| {
            repo::write_row(tx, &block)?;
            outbox::enqueue(tx, Entity::TimeBlock, &block.id, SyncOp::Upsert)?;
            JobLogic::schedule_delayed_achievement_check(tx, block.created_at)
        })?;

        ttlog_quiet(
            &pool.conn,
            "add",
            &block.date.to_string(),
            &format!(
                "{} {}-{} '{}'",
                block.category_id,
                time_to_db(block.start_time),
                time_to_db(block.end_time),
                block.title
            ),
        );
        tracing::debug!(id = %block.id, "time block created");

        Ok(block)
    }

    pub fn update(pool: &mut DbPool, id: &str, changes: BlockChanges) -> AppResult<TimeBlock> {
        let mut b = Self::get(pool, id)?;

        if let Some(title) = changes.title {
            check_title(&title)?;
            b.title = title.trim().to_string();
        }
        if let Some(desc) = changes.description {
            let desc = desc.trim();
            b.description = (!desc.is_empty()).then(|| desc.to_string());
        }
        if let Some(start) = changes.start {
            b.start_time = truncate_to_minute(start);
        }
        if let Some(end) = changes.end {
            b.end_time = truncate_to_minute(end);
        }
        check_window(b.start_time, b.end_time)?;
        if let Some(cat) = changes.category_id {
            check_category(pool, &cat)?;
            b.category_id = cat;
        }
        if let Some(date) = changes.date {
            b.date = date;
        }

        Self::save(pool, b, "edit")
    }

    /// Record the actual start. Completed blocks cannot be restarted.
    pub fn start(pool: &mut DbPool, id: &str, at: NaiveTime) -> AppResult<TimeBlock> {
        let mut b = Self::get(pool, id)?;
        if b.is_completed {
            return Err(AppError::Validation(format!("block '{}' is already completed", b.title)));
        }
        b.actual_start_time = Some(truncate_to_minute(at));
        b.actual_end_time = None;
        Self::save(pool, b, "start")
    }

    /// Record the actual end and mark completed. A block never started
    /// is taken as started at its planned start (or at `at`, if earlier).
    pub fn complete(pool: &mut DbPool, id: &str, at: NaiveTime) -> AppResult<TimeBlock> {
        let mut b = Self::get(pool, id)?;
        let at = truncate_to_minute(at);
        let started = b.actual_start_time.unwrap_or_else(|| b.start_time.min(at));
        if at < started {
            return Err(AppError::Validation(format!(
                "end {} is before the actual start {}",
                time_to_db(at),
                time_to_db(started)
            )));
        }
        b.actual_start_time = Some(started);
        b.actual_end_time = Some(at);
        b.is_completed = true;
        Self::save(pool, b, "complete")
    }

    pub fn set_actual_start(pool: &mut DbPool, id: &str, at: NaiveTime) -> AppResult<TimeBlock> {
        let mut b = Self::get(pool, id)?;
        let at = truncate_to_minute(at);
        if let Some(end) = b.actual_end_time
            && at > end
        {
            return Err(AppError::Validation(format!(
                "actual start {} is after the actual end {}",
                time_to_db(at),
                time_to_db(end)
            )));
        }
        b.actual_start_time = Some(at);
        Self::save(pool, b, "edit")
    }

    /// The actual start must already be recorded.
    pub fn set_actual_end(pool: &mut DbPool, id: &str, at: NaiveTime) -> AppResult<TimeBlock> {
        let mut b = Self::get(pool, id)?;
        let at = truncate_to_minute(at);
        match b.actual_start_time {
            None => {
                return Err(AppError::Validation(format!(
                    "block '{}' has no actual start yet",
                    b.title
                )));
            }
            Some(start) if at < start => {
                return Err(AppError::Validation(format!(
                    "actual end {} is before the actual start {}",
                    time_to_db(at),
                    time_to_db(start)
                )));
            }
            Some(_) => {}
        }
        b.actual_end_time = Some(at);
        Self::save(pool, b, "edit")
    }

    pub fn delete(pool: &mut DbPool, id: &str) -> AppResult<()> {
        let b = Self::get(pool, id)?;
        repo::delete_block(pool, id)?;
        ttlog_quiet(&pool.conn, "del", &b.date.to_string(), &format!("Deleted '{}'", b.title));
        Ok(())
    }

    /// Remove every block of `date`.
    pub fn purge_date(pool: &mut DbPool, date: NaiveDate) -> AppResult<usize> {
        let n = repo::delete_blocks_for_date(pool, date)?;
        if n > 0 {
            ttlog_quiet(&pool.conn, "del", &date.to_string(), &format!("Deleted {n} block(s)"));
        }
        Ok(n)
    }

    pub fn get(pool: &DbPool, id: &str) -> AppResult<TimeBlock> {
        repo::get_block(&pool.conn, id)?.ok_or_else(|| AppError::not_found("Time block", id))
    }

    /// Look a block up by full id or by an unambiguous id prefix
    /// (at least 4 characters), as printed by the list views.
    pub fn resolve(pool: &DbPool, key: &str) -> AppResult<TimeBlock> {
        let key = key.trim();
        if let Some(b) = repo::get_block(&pool.conn, key)? {
            return Ok(b);
        }
        if key.len() < 4 {
            return Err(AppError::not_found("Time block", key));
        }

        let ids = repo::ids_with_prefix(&pool.conn, key, 2)?;
        match ids.as_slice() {
            [id] => Self::get(pool, id),
            [] => Err(AppError::not_found("Time block", key)),
            _ => Err(AppError::Validation(format!("id prefix '{key}' is ambiguous"))),
        }
    }

    pub fn daily(pool: &DbPool, date: NaiveDate) -> AppResult<Vec<TimeBlock>> {
        repo::blocks_for_date(&pool.conn, date)
    }

    pub fn completed_for_date(pool: &DbPool, date: NaiveDate) -> AppResult<Vec<TimeBlock>> {
        repo::completed_blocks_for_date(&pool.conn, date)
    }

    pub fn range(pool: &DbPool, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<TimeBlock>> {
        if from > to {
            return Err(AppError::InvalidDate(format!("{from} is after {to}")));
        }
        repo::blocks_in_range(&pool.conn, from, to)
    }

    pub fn active_at(pool: &DbPool, date: NaiveDate, time: NaiveTime) -> AppResult<Vec<TimeBlock>> {
        repo::active_blocks(&pool.conn, date, truncate_to_minute(time))
    }

    fn save(pool: &mut DbPool, mut b: TimeBlock, op: &str) -> AppResult<TimeBlock> {
        b.updated_at = now_millis();
        repo::update_block(pool, &b)?;
        ttlog_quiet(&pool.conn, op, &b.id, &format!("'{}'", b.title));
        Ok(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::categories::CategoryLogic;
    use crate::db::outbox::pending;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn pool() -> DbPool {
        let mut pool = DbPool::open_in_memory().unwrap();
        CategoryLogic::seed_defaults(&mut pool).unwrap();
        pool
    }

    fn new_block(title: &str, start: NaiveTime, end: NaiveTime) -> NewBlock {
        NewBlock {
            title: title.into(),
            description: None,
            start,
            end,
            category_id: "cat_work".into(),
            date: day(),
        }
    }

    #[test]
    fn rejects_inverted_or_empty_window() {
        let mut pool = pool();
        for (s, e) in [(t(10, 0), t(9, 0)), (t(9, 0), t(9, 0))] {
            assert!(matches!(
                BlockLogic::create(&mut pool, new_block("x", s, e)),
                Err(AppError::Validation(_))
            ));
        }
        assert!(BlockLogic::daily(&pool, day()).unwrap().is_empty());
    }

    #[test]
    fn rejects_blank_title_and_unknown_category() {
        let mut pool = pool();
        assert!(BlockLogic::create(&mut pool, new_block("   ", t(9, 0), t(10, 0))).is_err());

        let mut nb = new_block("x", t(9, 0), t(10, 0));
        nb.category_id = "cat_missing".into();
        assert!(matches!(
            BlockLogic::create(&mut pool, nb),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn failed_scheduling_leaves_no_block_behind() {
        let mut pool = pool();
        pool.conn.execute_batch("DROP TABLE jobs").unwrap();

        assert!(BlockLogic::create(&mut pool, new_block("Deep work", t(9, 0), t(10, 0))).is_err());
        assert!(BlockLogic::daily(&pool, day()).unwrap().is_empty());
        assert!(
            pending(&pool.conn)
                .unwrap()
                .iter()
                .all(|e| e.entity != Entity::TimeBlock)
        );
    }

    #[test]
    fn create_schedules_delayed_check_and_queues_sync() {
        let mut pool = pool();
        let b = BlockLogic::create(&mut pool, new_block("Deep work", t(9, 0), t(10, 0))).unwrap();

        let jobs = JobLogic::list(&pool.conn).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "delayed_achievement_check");
        assert!(pending(&pool.conn).unwrap().iter().any(|e| e.record_id == b.id));
    }

    #[test]
    fn start_then_complete_records_actual_window() {
        let mut pool = pool();
        let b = BlockLogic::create(&mut pool, new_block("run", t(7, 0), t(8, 0))).unwrap();
        BlockLogic::start(&mut pool, &b.id, t(7, 10)).unwrap();
        let done = BlockLogic::complete(&mut pool, &b.id, t(7, 55)).unwrap();

        assert!(done.is_finished());
        assert_eq!(done.actual_duration(), Some(45));
        assert_eq!(BlockLogic::completed_for_date(&pool, day()).unwrap().len(), 1);
        assert!(BlockLogic::start(&mut pool, &b.id, t(9, 0)).is_err());
    }

    #[test]
    fn actual_end_needs_a_start_before_it() {
        let mut pool = pool();
        let b = BlockLogic::create(&mut pool, new_block("read", t(20, 0), t(21, 0))).unwrap();
        assert!(BlockLogic::set_actual_end(&mut pool, &b.id, t(21, 0)).is_err());

        BlockLogic::set_actual_start(&mut pool, &b.id, t(20, 5)).unwrap();
        assert!(BlockLogic::set_actual_end(&mut pool, &b.id, t(20, 0)).is_err());
        let b = BlockLogic::set_actual_end(&mut pool, &b.id, t(20, 50)).unwrap();
        assert!(!b.is_completed);
        assert_eq!(b.actual_duration(), Some(45));
    }

    #[test]
    fn update_keeps_window_valid() {
        let mut pool = pool();
        let b = BlockLogic::create(&mut pool, new_block("x", t(9, 0), t(10, 0))).unwrap();
        let bad = BlockChanges {
            start: Some(t(11, 0)),
            ..Default::default()
        };
        assert!(BlockLogic::update(&mut pool, &b.id, bad).is_err());

        let moved = BlockLogic::update(
            &mut pool,
            &b.id,
            BlockChanges {
                start: Some(t(11, 0)),
                end: Some(t(12, 0)),
                category_id: Some("cat_sport".into()),
                description: Some("  ".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(moved.category_id, "cat_sport");
        assert_eq!(moved.description, None);
        assert_eq!(BlockLogic::active_at(&pool, day(), t(11, 30)).unwrap().len(), 1);
    }

    #[test]
    fn delete_is_visible_to_daily_and_range_queries() {
        let mut pool = pool();
        let b = BlockLogic::create(&mut pool, new_block("x", t(9, 0), t(10, 0))).unwrap();
        BlockLogic::delete(&mut pool, &b.id).unwrap();
        assert!(BlockLogic::daily(&pool, day()).unwrap().is_empty());
        assert!(BlockLogic::range(&pool, day(), day()).unwrap().is_empty());
    }

    #[test]
    fn purge_removes_whole_day() {
        let mut pool = pool();
        BlockLogic::create(&mut pool, new_block("a", t(9, 0), t(10, 0))).unwrap();
        BlockLogic::create(&mut pool, new_block("b", t(10, 0), t(11, 0))).unwrap();
        assert_eq!(BlockLogic::purge_date(&mut pool, day()).unwrap(), 2);
        assert_eq!(BlockLogic::purge_date(&mut pool, day()).unwrap(), 0);
    }

    #[test]
    fn resolve_accepts_unique_prefix() {
        let mut pool = pool();
        let b = BlockLogic::create(&mut pool, new_block("a", t(9, 0), t(10, 0))).unwrap();

        assert_eq!(BlockLogic::resolve(&pool, &b.id).unwrap().id, b.id);
        assert_eq!(BlockLogic::resolve(&pool, &b.id[..8]).unwrap().id, b.id);
        assert!(matches!(
            BlockLogic::resolve(&pool, &b.id[..2]),
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            BlockLogic::resolve(&pool, "zzzzzzzz"),
            Err(AppError::NotFound { .. })
        ));
    }
}
