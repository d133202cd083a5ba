//! `achievements` table access.
//!
//! Unlocks are one-way: the queries never reset `is_unlocked`, and a
//! trigger aborts any statement that tries.

use crate::db::outbox::{self, Entity, SyncOp};
use crate::db::pool::DbPool;
use crate::db::watch::{LiveQuery, Table};
use crate::errors::{AppError, AppResult};
use crate::models::achievement::catalogue;
use crate::models::{Achievement, AchievementType, Rarity};
use rusqlite::{Connection, OptionalExtension, Row, params};

// Legendary first, then by type and id.
const SELECT: &str = "SELECT id, kind, title, description, rarity, is_unlocked,
        progress, max_progress, unlocked_at
     FROM achievements";
const ORDER: &str = "ORDER BY CASE rarity
        WHEN 'legendary' THEN 0 WHEN 'epic' THEN 1 WHEN 'rare' THEN 2 ELSE 3 END,
        kind ASC, max_progress ASC, id ASC";

pub fn map_row(row: &Row) -> rusqlite::Result<Achievement> {
    let kind: String = row.get("kind")?;
    let rarity: String = row.get("rarity")?;
    Ok(Achievement {
        id: row.get("id")?,
        kind: AchievementType::from_db_str(&kind).map_err(|e| e.into_sql(1))?,
        title: row.get("title")?,
        description: row.get("description")?,
        rarity: Rarity::from_db_str(&rarity).map_err(|e| e.into_sql(4))?,
        is_unlocked: row.get("is_unlocked")?,
        progress: row.get("progress")?,
        max_progress: row.get("max_progress")?,
        unlocked_at: row.get("unlocked_at")?,
    })
}

fn collect(stmt: &mut rusqlite::CachedStatement<'_>, args: impl rusqlite::Params) -> AppResult<Vec<Achievement>> {
    let rows = stmt.query_map(args, map_row)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Insert the catalogue entries that are missing. Returns how many were added.
pub fn seed(pool: &mut DbPool) -> AppResult<usize> {
    pool.write(Table::Achievements, |tx| {
        let mut added = 0;
        for a in catalogue() {
            added += tx.execute(
                "INSERT OR IGNORE INTO achievements
                     (id, kind, title, description, rarity, is_unlocked, progress, max_progress)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6)",
                params![
                    a.id,
                    a.kind.to_db_str(),
                    a.title,
                    a.description,
                    a.rarity.to_db_str(),
                    a.max_progress
                ],
            )?;
        }
        Ok(added)
    })
}

/// Merge a remote copy: unlock and progress only move forward, and an
/// unlocked result always carries full progress.
pub(crate) fn merge_row(conn: &Connection, a: &Achievement) -> AppResult<()> {
    conn.execute(
        "INSERT INTO achievements
             (id, kind, title, description, rarity, is_unlocked, progress, max_progress, unlocked_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, CASE WHEN ?6 THEN ?8 ELSE MIN(?7, ?8) END, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
             is_unlocked = MAX(achievements.is_unlocked, excluded.is_unlocked),
             unlocked_at = COALESCE(achievements.unlocked_at, excluded.unlocked_at),
             progress = CASE
                 WHEN MAX(achievements.is_unlocked, excluded.is_unlocked) = 1
                     THEN achievements.max_progress
                 ELSE MIN(MAX(achievements.progress, excluded.progress), achievements.max_progress)
             END",
        params![
            a.id,
            a.kind.to_db_str(),
            a.title,
            a.description,
            a.rarity.to_db_str(),
            a.is_unlocked,
            a.progress.max(0),
            a.max_progress,
            a.unlocked_at,
        ],
    )?;
    Ok(())
}

/// Mark unlocked at `now` (epoch ms). Returns `false` when it already was.
pub fn unlock(pool: &mut DbPool, id: &str, now: i64) -> AppResult<bool> {
    pool.write(Table::Achievements, |tx| {
        if get_achievement(tx, id)?.is_none() {
            return Err(AppError::not_found("Achievement", id));
        }
        let n = tx.execute(
            "UPDATE achievements
             SET is_unlocked = 1, unlocked_at = COALESCE(unlocked_at, ?2), progress = max_progress
             WHERE id = ?1 AND is_unlocked = 0",
            params![id, now],
        )?;
        if n > 0 {
            outbox::enqueue(tx, Entity::Achievement, id, SyncOp::Upsert)?;
        }
        Ok(n > 0)
    })
}

/// Store progress, clamped to `max_progress`. Unlocked rows stay at max.
pub fn update_progress(pool: &mut DbPool, id: &str, progress: i32) -> AppResult<()> {
    pool.write(Table::Achievements, |tx| {
        let n = tx.execute(
            "UPDATE achievements
             SET progress = CASE WHEN is_unlocked = 1 THEN max_progress
                                 ELSE MIN(?2, max_progress) END
             WHERE id = ?1",
            params![id, progress],
        )?;
        if n == 0 {
            return Err(AppError::not_found("Achievement", id));
        }
        outbox::enqueue(tx, Entity::Achievement, id, SyncOp::Upsert)
    })
}

pub fn get_achievement(conn: &Connection, id: &str) -> AppResult<Option<Achievement>> {
    let sql = format!("{SELECT} WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([id], map_row).optional()?)
}

pub fn list_achievements(conn: &Connection) -> AppResult<Vec<Achievement>> {
    let sql = format!("{SELECT} {ORDER}");
    collect(&mut conn.prepare_cached(&sql)?, params![])
}

pub fn unlocked_achievements(conn: &Connection) -> AppResult<Vec<Achievement>> {
    let sql = format!("{SELECT} WHERE is_unlocked = 1 {ORDER}");
    collect(&mut conn.prepare_cached(&sql)?, params![])
}

pub fn achievements_by_type(conn: &Connection, kind: AchievementType) -> AppResult<Vec<Achievement>> {
    let sql = format!("{SELECT} WHERE kind = ?1 {ORDER}");
    collect(&mut conn.prepare_cached(&sql)?, [kind.to_db_str()])
}

pub fn unlocked_count(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM achievements WHERE is_unlocked = 1",
        [],
        |row| row.get(0),
    )?)
}

pub fn watch_achievements(pool: &DbPool) -> LiveQuery<Vec<Achievement>> {
    pool.watch(Table::Achievements, list_achievements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> DbPool {
        let mut pool = DbPool::open_in_memory().unwrap();
        seed(&mut pool).unwrap();
        pool
    }

    #[test]
    fn seeding_twice_keeps_one_copy() {
        let mut pool = seeded();
        assert_eq!(seed(&mut pool).unwrap(), 0);
        assert_eq!(list_achievements(&pool.conn).unwrap().len(), 11);
    }

    #[test]
    fn listing_puts_legendary_first() {
        let pool = seeded();
        let all = list_achievements(&pool.conn).unwrap();
        assert_eq!(all[0].id, "streak_100");
        assert_eq!(all.last().unwrap().rarity, Rarity::Common);
    }

    #[test]
    fn unlock_is_one_way_and_keeps_first_timestamp() {
        let mut pool = seeded();
        assert!(unlock(&mut pool, "streak_3", 1_000).unwrap());
        assert!(!unlock(&mut pool, "streak_3", 2_000).unwrap());

        let a = get_achievement(&pool.conn, "streak_3").unwrap().unwrap();
        assert!(a.is_unlocked);
        assert_eq!(a.unlocked_at, Some(1_000));
        assert_eq!(a.progress, 3);

        let relock = pool
            .conn
            .execute("UPDATE achievements SET is_unlocked = 0 WHERE id = 'streak_3'", []);
        assert!(relock.is_err());
        assert_eq!(unlocked_count(&pool.conn).unwrap(), 1);
    }

    #[test]
    fn progress_is_clamped_to_max() {
        let mut pool = seeded();
        update_progress(&mut pool, "streak_7", 42).unwrap();
        let a = get_achievement(&pool.conn, "streak_7").unwrap().unwrap();
        assert_eq!(a.progress, 7);
        assert!(!a.is_unlocked);
    }

    #[test]
    fn merge_never_relocks() {
        let mut pool = seeded();
        unlock(&mut pool, "early_bird", 5).unwrap();

        let mut remote = get_achievement(&pool.conn, "early_bird").unwrap().unwrap();
        remote.is_unlocked = false;
        remote.progress = 0;
        remote.unlocked_at = None;
        merge_row(&pool.conn, &remote).unwrap();

        let a = get_achievement(&pool.conn, "early_bird").unwrap().unwrap();
        assert!(a.is_unlocked);
        assert_eq!(a.unlocked_at, Some(5));
    }

    #[test]
    fn merged_unlock_fills_progress() {
        let mut pool = seeded();
        update_progress(&mut pool, "hours_200", 40).unwrap();

        let mut remote = get_achievement(&pool.conn, "hours_200").unwrap().unwrap();
        remote.is_unlocked = true;
        remote.progress = 120;
        remote.unlocked_at = Some(9);
        merge_row(&pool.conn, &remote).unwrap();

        let a = get_achievement(&pool.conn, "hours_200").unwrap().unwrap();
        assert!(a.is_unlocked);
        assert_eq!(a.progress, a.max_progress);
        assert_eq!(a.unlocked_at, Some(9));

        // not yet seeded locally
        let fresh = DbPool::open_in_memory().unwrap();
        remote.progress = 1;
        merge_row(&fresh.conn, &remote).unwrap();
        let a = get_achievement(&fresh.conn, "hours_200").unwrap().unwrap();
        assert_eq!(a.progress, a.max_progress);
    }

    #[test]
    fn type_filter_returns_only_that_type() {
        let pool = seeded();
        let streaks = achievements_by_type(&pool.conn, AchievementType::Streak).unwrap();
        assert_eq!(streaks.len(), 4);
        assert!(streaks.iter().all(|a| a.kind == AchievementType::Streak));
    }

    #[test]
    fn live_list_reflects_unlocks() {
        let mut pool = seeded();
        let live = watch_achievements(&pool);

        assert!(unlock(&mut pool, "early_bird", 42).unwrap());
        let snapshot = live.poll(&pool).unwrap().expect("unlock notified");
        let early = snapshot.iter().find(|a| a.id == "early_bird").unwrap();
        assert!(early.is_unlocked);
        assert_eq!(early.unlocked_at, Some(42));
    }
}
