use crate::core::statistics::StatisticsLogic;
use crate::db::achievements as repo;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::stats::{category_stats, total_hours};
use crate::db::time_blocks::blocks_in_range;
use crate::errors::{AppError, AppResult};
use crate::models::{Achievement, AchievementType};
use crate::utils::date::{months_before, weeks_before, years_before};
use chrono::{NaiveDate, NaiveTime};

const STREAK_TIERS: [(u32, &str); 4] = [
    (3, "streak_3"),
    (7, "streak_7"),
    (30, "streak_30"),
    (100, "streak_100"),
];
const HOUR_TIERS: [(f64, &str); 3] = [
    (50.0, "hours_50"),
    (200.0, "hours_200"),
    (1000.0, "hours_1000"),
];
const MASTERY_MINUTES: f64 = 600.0;
const PERFECT_WEEK_RATIO: f64 = 0.9;

fn early_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn late_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Achievement catalogue, manual unlocks and rule evaluation.
pub struct AchievementLogic;

impl AchievementLogic {
    pub fn seed(pool: &mut DbPool) -> AppResult<usize> {
        repo::seed(pool)
    }

    pub fn list(pool: &DbPool) -> AppResult<Vec<Achievement>> {
        repo::list_achievements(&pool.conn)
    }

    pub fn unlocked(pool: &DbPool) -> AppResult<Vec<Achievement>> {
        repo::unlocked_achievements(&pool.conn)
    }

    pub fn get(pool: &DbPool, id: &str) -> AppResult<Achievement> {
        repo::get_achievement(&pool.conn, id)?.ok_or_else(|| AppError::not_found("Achievement", id))
    }

    pub fn get_by_type(pool: &DbPool, kind: AchievementType) -> AppResult<Vec<Achievement>> {
        repo::achievements_by_type(&pool.conn, kind)
    }

    pub fn unlocked_count(pool: &DbPool) -> AppResult<i64> {
        repo::unlocked_count(&pool.conn)
    }

    /// Returns `false` when it was already unlocked.
    pub fn unlock(pool: &mut DbPool, id: &str, now: i64) -> AppResult<bool> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::Validation("achievement id cannot be blank".into()));
        }

        let newly = repo::unlock(pool, id, now)?;
        if newly {
            ttlog_quiet(&pool.conn, "unlock", id, "Achievement unlocked");
            tracing::info!(achievement = id, "achievement unlocked");
        }
        Ok(newly)
    }

    pub fn update_progress(pool: &mut DbPool, id: &str, progress: i32) -> AppResult<()> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::Validation("achievement id cannot be blank".into()));
        }
        if progress < 0 {
            return Err(AppError::Validation("progress cannot be negative".into()));
        }
        repo::update_progress(pool, id, progress)
    }

    /// Recompute every rule against the stored blocks and unlock what is
    /// earned. Returns the ids unlocked by this call.
    pub fn evaluate(pool: &mut DbPool, today: NaiveDate, now: i64) -> AppResult<Vec<String>> {
        repo::seed(pool)?;
        let mut earned: Vec<&'static str> = Vec::new();

        // Streak
        let streak = StatisticsLogic::current_streak(&pool.conn, today)?;
        for (days, id) in STREAK_TIERS {
            Self::track(pool, id, i64::from(streak))?;
            if streak >= days {
                earned.push(id);
            }
        }

        // Total hours, trailing year
        let hours = total_hours(&pool.conn, years_before(today, 1), today)?;
        for (threshold, id) in HOUR_TIERS {
            Self::track(pool, id, hours.floor() as i64)?;
            if hours >= threshold {
                earned.push(id);
            }
        }

        // Category mastery, trailing month
        let best_minutes = category_stats(&pool.conn, months_before(today, 1), today)?
            .iter()
            .map(|c| c.total_minutes)
            .fold(0.0, f64::max);
        Self::track(pool, "category_10", (best_minutes / 60.0).floor() as i64)?;
        if best_minutes >= MASTERY_MINUTES {
            earned.push("category_10");
        }

        // Week-based rules
        let week = blocks_in_range(&pool.conn, weeks_before(today, 1), today)?;
        if !week.is_empty() {
            let done = week.iter().filter(|b| b.is_completed).count();
            let ratio = done as f64 / week.len() as f64;
            Self::track(pool, "perfect_week", (ratio * 100.0).floor() as i64)?;
            if ratio >= PERFECT_WEEK_RATIO {
                earned.push("perfect_week");
            }
        }

        let starts: Vec<NaiveTime> = week.iter().filter_map(|b| b.actual_start_time).collect();
        if starts.iter().any(|s| *s < early_cutoff()) {
            earned.push("early_bird");
        }
        if starts.iter().any(|s| *s > late_cutoff()) {
            earned.push("night_owl");
        }

        let mut unlocked = Vec::new();
        for id in earned {
            if Self::unlock(pool, id, now)? {
                unlocked.push(id.to_string());
            }
        }

        tracing::debug!(streak, hours, unlocked = unlocked.len(), "achievements evaluated");
        Ok(unlocked)
    }

    /// Store progress only when it moved, to keep the outbox quiet.
    fn track(pool: &mut DbPool, id: &str, value: i64) -> AppResult<()> {
        let Some(a) = repo::get_achievement(&pool.conn, id)? else {
            return Ok(());
        };
        if a.is_unlocked {
            return Ok(());
        }
        let clamped = value.clamp(0, i64::from(a.max_progress)) as i32;
        if clamped != a.progress {
            repo::update_progress(pool, id, clamped)?;
        }
        Ok(())
    }
}
