//! Incremental mirror of the local store to a [`RemoteStore`].
//!
//! `push` drains the outbox oldest-first and stops at the first remote
//! error; everything acknowledged before it stays acknowledged. `pull` only
//! adds records missing locally, except achievements whose unlocks merge.
//! Pulled rows obey the local rules: a category must be valid and fit the
//! tier limit, and a block must point at a category that exists here.

use crate::core::user::UserLogic;
use crate::db::outbox::{self, Entity, OutboxEntry, SyncOp};
use crate::db::pool::DbPool;
use crate::db::watch::Table;
use crate::db::{achievements, categories, log::ttlog_quiet, time_blocks, user_settings};
use crate::errors::AppResult;
use crate::models::category::parse_hex_color;
use crate::models::user::MAX_CATEGORIES_FREE;
use crate::models::{Achievement, Category, TimeBlock, UserSettings};
use crate::remote::{Collection, RemoteStore};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushReport {
    pub pushed: usize,
    pub remaining: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PullReport {
    pub profile: bool,
    pub categories: usize,
    pub time_blocks: usize,
    pub achievements_unlocked: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub signed_in: bool,
    pub pending: Vec<(Entity, i64)>,
    pub last_sync_time: Option<i64>,
}

impl SyncStatus {
    pub fn total_pending(&self) -> i64 {
        self.pending.iter().map(|(_, n)| n).sum()
    }
}

fn collection_of(entity: Entity) -> Option<Collection> {
    match entity {
        Entity::TimeBlock => Some(Collection::TimeBlocks),
        Entity::Category => Some(Collection::Categories),
        Entity::Achievement => Some(Collection::Achievements),
        Entity::User => None,
    }
}

pub struct SyncLogic;

impl SyncLogic {
    pub fn push(
        pool: &mut DbPool,
        remote: &dyn RemoteStore,
        user_id: Option<&str>,
        now: i64,
    ) -> AppResult<PushReport> {
        let Some(uid) = user_id else {
            tracing::debug!("push skipped: not signed in");
            return Ok(PushReport::default());
        };

        let entries = outbox::pending(&pool.conn)?;
        let total = entries.len();
        let mut pushed = 0;

        for entry in &entries {
            if let Err(e) = Self::send(pool, remote, uid, entry) {
                tracing::warn!(
                    entity = entry.entity.to_db_str(),
                    record = %entry.record_id,
                    error = %e,
                    "push stopped"
                );
                ttlog_quiet(
                    &pool.conn,
                    "sync_push",
                    uid,
                    &format!("Pushed {pushed}/{total}, stopped: {e}"),
                );
                return Err(e);
            }
            outbox::ack(&pool.conn, entry.id)?;
            pushed += 1;
        }

        user_settings::update_last_sync(pool, uid, now)?;
        if pushed > 0 {
            ttlog_quiet(&pool.conn, "sync_push", uid, &format!("Pushed {pushed} change(s)"));
        }
        tracing::debug!(pushed, "push complete");

        Ok(PushReport {
            pushed,
            remaining: 0,
        })
    }

    fn send(pool: &DbPool, remote: &dyn RemoteStore, uid: &str, entry: &OutboxEntry) -> AppResult<()> {
        let conn = &pool.conn;
        let id = entry.record_id.as_str();

        match (entry.entity, entry.op) {
            (Entity::User, SyncOp::Upsert) => match user_settings::get_settings(conn, id)? {
                Some(s) => remote.put_profile(id, &s),
                None => Ok(()),
            },
            (Entity::User, SyncOp::Delete) => remote.delete_profile(id),
            (entity, SyncOp::Delete) => match collection_of(entity) {
                Some(coll) => remote.delete(uid, coll, id),
                None => Ok(()),
            },
            (entity, SyncOp::Upsert) => {
                let doc = match entity {
                    Entity::TimeBlock => time_blocks::get_block(conn, id)?
                        .map(serde_json::to_value)
                        .transpose()?,
                    Entity::Category => categories::get_category(conn, id)?
                        .map(serde_json::to_value)
                        .transpose()?,
                    Entity::Achievement => achievements::get_achievement(conn, id)?
                        .map(serde_json::to_value)
                        .transpose()?,
                    Entity::User => None,
                };
                match (doc, collection_of(entity)) {
                    (Some(doc), Some(coll)) => remote.put(uid, coll, id, &doc),
                    // Gone locally since it was queued; its tombstone follows.
                    _ => Ok(()),
                }
            }
        }
    }

    pub fn pull(
        pool: &mut DbPool,
        remote: &dyn RemoteStore,
        user_id: Option<&str>,
    ) -> AppResult<PullReport> {
        let Some(uid) = user_id else {
            tracing::debug!("pull skipped: not signed in");
            return Ok(PullReport::default());
        };
        let mut report = PullReport::default();

        if let Some(profile) = remote.get_profile(uid)?
            && user_settings::get_settings(&pool.conn, uid)?.is_none()
        {
            let profile = UserSettings {
                user_id: uid.to_string(),
                ..profile
            };
            pool.write(Table::UserSettings, |tx| user_settings::write_row(tx, &profile))?;
            report.profile = true;
        }

        // Categories before blocks, so pulled blocks find their category.
        let limit = UserLogic::category_limit(pool, Some(uid), MAX_CATEGORIES_FREE)?;
        let cats: Vec<Category> = decode_all(remote.list(uid, Collection::Categories)?, &mut report);
        // remote category id -> local category carrying the same name
        let mut same_name: HashMap<String, String> = HashMap::new();
        let (added, rejected) = pool.write(Table::Categories, |tx| {
            let (mut added, mut rejected) = (0, 0);
            for c in &cats {
                if categories::get_category(tx, &c.id)?.is_some() {
                    continue;
                }
                if let Some(local) = categories::find_by_name(tx, &c.name)? {
                    tracing::debug!(
                        remote = %c.id,
                        local = %local.id,
                        name = %c.name,
                        "category matched by name"
                    );
                    same_name.insert(c.id.clone(), local.id);
                    continue;
                }
                if c.name.trim().is_empty() || parse_hex_color(&c.color).is_err() {
                    tracing::warn!(id = %c.id, color = %c.color, "invalid remote category skipped");
                    rejected += 1;
                    continue;
                }
                if !c.is_default && categories::count_categories(tx)? >= i64::from(limit) {
                    tracing::warn!(id = %c.id, limit, "remote category over the tier limit, skipped");
                    rejected += 1;
                    continue;
                }
                categories::write_row(tx, c)?;
                added += 1;
            }
            Ok((added, rejected))
        })?;
        report.categories = added;
        report.skipped += rejected;

        let blocks: Vec<TimeBlock> = decode_all(remote.list(uid, Collection::TimeBlocks)?, &mut report);
        let (added, rejected) = pool.write(Table::TimeBlocks, |tx| {
            let (mut added, mut rejected) = (0, 0);
            for b in &blocks {
                if time_blocks::exists(tx, &b.id)? {
                    continue;
                }
                if b.start_time >= b.end_time {
                    rejected += 1;
                    continue;
                }
                if let Some(local) = same_name.get(&b.category_id) {
                    // Re-pointed locally; queue it so the remote copy follows.
                    let b = TimeBlock {
                        category_id: local.clone(),
                        ..b.clone()
                    };
                    time_blocks::write_row(tx, &b)?;
                    outbox::enqueue(tx, Entity::TimeBlock, &b.id, SyncOp::Upsert)?;
                    added += 1;
                    continue;
                }
                if categories::get_category(tx, &b.category_id)?.is_none() {
                    tracing::warn!(
                        id = %b.id,
                        category = %b.category_id,
                        "remote block without category skipped"
                    );
                    rejected += 1;
                    continue;
                }
                time_blocks::write_row(tx, b)?;
                added += 1;
            }
            Ok((added, rejected))
        })?;
        report.time_blocks = added;
        report.skipped += rejected;

        let remote_achievements: Vec<Achievement> =
            decode_all(remote.list(uid, Collection::Achievements)?, &mut report);
        report.achievements_unlocked = pool.write(Table::Achievements, |tx| {
            let mut n = 0;
            for a in &remote_achievements {
                let was_unlocked = achievements::get_achievement(tx, &a.id)?
                    .map(|l| l.is_unlocked)
                    .unwrap_or(false);
                achievements::merge_row(tx, a)?;
                if a.is_unlocked && !was_unlocked {
                    n += 1;
                }
            }
            Ok(n)
        })?;

        ttlog_quiet(
            &pool.conn,
            "sync_pull",
            uid,
            &format!(
                "Pulled {} block(s), {} category(ies), {} unlock(s)",
                report.time_blocks, report.categories, report.achievements_unlocked
            ),
        );
        Ok(report)
    }

    pub fn status(pool: &DbPool, user_id: Option<&str>) -> AppResult<SyncStatus> {
        let last_sync_time = match user_id {
            Some(uid) => user_settings::get_settings(&pool.conn, uid)?.and_then(|s| s.last_sync_time),
            None => None,
        };
        Ok(SyncStatus {
            signed_in: user_id.is_some(),
            pending: outbox::pending_counts(&pool.conn)?,
            last_sync_time,
        })
    }
}

/// Decode documents, skipping (and counting) the malformed ones.
fn decode_all<T: DeserializeOwned>(docs: Vec<Value>, report: &mut PullReport) -> Vec<T> {
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        match serde_json::from_value(doc) {
            Ok(v) => out.push(v),
            Err(e) => {
                tracing::warn!(error = %e, "malformed remote document skipped");
                report.skipped += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::achievements::AchievementLogic;
    use crate::remote::MemoryRemote;
    use chrono::{NaiveDate, NaiveTime};

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn block(title: &str) -> TimeBlock {
        let day = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        TimeBlock::new(title, None, t(9), t(10), "cat_work", day)
    }

    fn signed_in_pool() -> DbPool {
        let mut pool = DbPool::open_in_memory().unwrap();
        user_settings::initialize(&mut pool, "u1", "en").unwrap();
        pool
    }

    #[test]
    fn signed_out_push_and_pull_are_noops() {
        let mut pool = DbPool::open_in_memory().unwrap();
        time_blocks::insert_block(&mut pool, &block("a")).unwrap();
        let remote = MemoryRemote::new();

        assert_eq!(SyncLogic::push(&mut pool, &remote, None, 1).unwrap(), PushReport::default());
        assert_eq!(SyncLogic::pull(&mut pool, &remote, None).unwrap(), PullReport::default());
        assert_eq!(SyncLogic::status(&pool, None).unwrap().total_pending(), 1);
    }

    #[test]
    fn push_sends_upserts_and_tombstones() {
        let mut pool = signed_in_pool();
        let remote = MemoryRemote::new();
        let keep = block("keep");
        let gone = block("gone");
        time_blocks::insert_block(&mut pool, &keep).unwrap();
        time_blocks::insert_block(&mut pool, &gone).unwrap();
        SyncLogic::push(&mut pool, &remote, Some("u1"), 10).unwrap();
        assert_eq!(remote.doc_count("u1", Collection::TimeBlocks), 2);

        time_blocks::delete_block(&mut pool, &gone.id).unwrap();
        let report = SyncLogic::push(&mut pool, &remote, Some("u1"), 20).unwrap();
        assert_eq!(report.pushed, 1);
        assert_eq!(remote.doc_count("u1", Collection::TimeBlocks), 1);
        assert!(remote.get("u1", Collection::TimeBlocks, &keep.id).is_some());

        let status = SyncLogic::status(&pool, Some("u1")).unwrap();
        assert_eq!(status.total_pending(), 0);
        assert_eq!(status.last_sync_time, Some(20));
    }

    #[test]
    fn failure_keeps_the_rest_queued() {
        let mut pool = signed_in_pool();
        for name in ["a", "b", "c"] {
            time_blocks::insert_block(&mut pool, &block(name)).unwrap();
        }
        // user row + 3 blocks queued; let two through
        let remote = MemoryRemote::new();
        remote.fail_after(2);

        assert!(SyncLogic::push(&mut pool, &remote, Some("u1"), 5).is_err());
        let status = SyncLogic::status(&pool, Some("u1")).unwrap();
        assert_eq!(status.total_pending(), 2);
        assert_eq!(status.last_sync_time, None);

        remote.heal();
        let report = SyncLogic::push(&mut pool, &remote, Some("u1"), 6).unwrap();
        assert_eq!(report.pushed, 2);
        assert_eq!(remote.doc_count("u1", Collection::TimeBlocks), 3);
    }

    #[test]
    fn pull_restores_missing_records_and_merges_unlocks() {
        let remote = MemoryRemote::new();

        let mut source = signed_in_pool();
        categories::seed_defaults(&mut source).unwrap();
        AchievementLogic::seed(&mut source).unwrap();
        time_blocks::insert_block(&mut source, &block("remote block")).unwrap();
        AchievementLogic::unlock(&mut source, "night_owl", 3).unwrap();
        SyncLogic::push(&mut source, &remote, Some("u1"), 4).unwrap();

        let mut fresh = DbPool::open_in_memory().unwrap();
        let report = SyncLogic::pull(&mut fresh, &remote, Some("u1")).unwrap();
        assert!(report.profile);
        assert_eq!(report.categories, 6);
        assert_eq!(report.time_blocks, 1);
        assert_eq!(report.achievements_unlocked, 1);

        let a = achievements::get_achievement(&fresh.conn, "night_owl").unwrap().unwrap();
        assert!(a.is_unlocked);

        // second pull adds nothing
        let again = SyncLogic::pull(&mut fresh, &remote, Some("u1")).unwrap();
        assert_eq!(again.time_blocks, 0);
        assert_eq!(again.achievements_unlocked, 0);
    }

    #[test]
    fn pulled_block_follows_local_category_with_same_name() {
        let remote = MemoryRemote::new();

        let mut source = signed_in_pool();
        let deep = Category::new("Deep", "#112233", "🧠", 0);
        categories::insert_category(&mut source, &deep).unwrap();
        let mut b = block("focus");
        b.category_id = deep.id.clone();
        time_blocks::insert_block(&mut source, &b).unwrap();
        SyncLogic::push(&mut source, &remote, Some("u1"), 1).unwrap();

        let mut target = signed_in_pool();
        let local = Category::new("Deep", "#445566", "", 0);
        categories::insert_category(&mut target, &local).unwrap();

        let report = SyncLogic::pull(&mut target, &remote, Some("u1")).unwrap();
        assert_eq!(report.categories, 0);
        assert_eq!(report.time_blocks, 1);

        let pulled = time_blocks::get_block(&target.conn, &b.id).unwrap().unwrap();
        assert_eq!(pulled.category_id, local.id);
        assert!(
            outbox::pending(&target.conn)
                .unwrap()
                .iter()
                .any(|e| e.record_id == b.id && e.op == SyncOp::Upsert)
        );
    }

    #[test]
    fn pull_skips_invalid_or_excess_categories_and_their_blocks() {
        let remote = MemoryRemote::new();
        let bad = Category {
            color: "blue".into(),
            ..Category::new("Paint", "#000000", "", 6)
        };
        let excess = Category::new("Chess", "#123456", "♟", 7);
        for c in [&bad, &excess] {
            let doc = serde_json::to_value(c).unwrap();
            remote.put("u1", Collection::Categories, &c.id, &doc).unwrap();
        }
        let mut orphan = block("orphan");
        orphan.category_id = bad.id.clone();
        let doc = serde_json::to_value(&orphan).unwrap();
        remote.put("u1", Collection::TimeBlocks, &orphan.id, &doc).unwrap();

        // six defaults already fill the free tier
        let mut target = signed_in_pool();
        categories::seed_defaults(&mut target).unwrap();

        let report = SyncLogic::pull(&mut target, &remote, Some("u1")).unwrap();
        assert_eq!(report.categories, 0);
        assert_eq!(report.time_blocks, 0);
        assert_eq!(report.skipped, 3);
        assert!(categories::find_by_name(&target.conn, "Chess").unwrap().is_none());
        assert!(categories::get_category(&target.conn, &bad.id).unwrap().is_none());
        assert!(!time_blocks::exists(&target.conn, &orphan.id).unwrap());
    }
}
