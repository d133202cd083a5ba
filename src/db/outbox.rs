//! Pending remote changes.
//!
//! Every local mutation queues one row here inside the same transaction.
//! Only the latest operation per record is kept: a later upsert or delete
//! replaces whatever was queued before for that record.

use crate::errors::{AppError, AppResult};
use crate::utils::time::now_millis;
use rusqlite::{Connection, Row, params};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    TimeBlock,
    Category,
    Achievement,
    User,
}

impl Entity {
    pub const ALL: [Entity; 4] = [
        Entity::TimeBlock,
        Entity::Category,
        Entity::Achievement,
        Entity::User,
    ];

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Entity::TimeBlock => "time_block",
            Entity::Category => "category",
            Entity::Achievement => "achievement",
            Entity::User => "user",
        }
    }

    pub fn from_db_str(s: &str) -> AppResult<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.to_db_str() == s)
            .ok_or_else(|| AppError::unknown_variant("outbox entity", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Upsert,
    /// Tombstone: the remote copy must be removed.
    Delete,
}

impl SyncOp {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SyncOp::Upsert => "upsert",
            SyncOp::Delete => "delete",
        }
    }

    pub fn from_db_str(s: &str) -> AppResult<Self> {
        match s {
            "upsert" => Ok(SyncOp::Upsert),
            "delete" => Ok(SyncOp::Delete),
            other => Err(AppError::unknown_variant("outbox op", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub id: i64,
    pub entity: Entity,
    pub record_id: String,
    pub op: SyncOp,
    pub queued_at: i64,
}

fn map_row(row: &Row) -> rusqlite::Result<OutboxEntry> {
    let entity: String = row.get("entity")?;
    let op: String = row.get("op")?;
    Ok(OutboxEntry {
        id: row.get("id")?,
        entity: Entity::from_db_str(&entity).map_err(|e| e.into_sql(1))?,
        record_id: row.get("record_id")?,
        op: SyncOp::from_db_str(&op).map_err(|e| e.into_sql(3))?,
        queued_at: row.get("queued_at")?,
    })
}

/// Queue `op` for a record, superseding any older entry for it.
pub fn enqueue(conn: &Connection, entity: Entity, record_id: &str, op: SyncOp) -> AppResult<()> {
    conn.execute(
        "DELETE FROM sync_outbox WHERE entity = ?1 AND record_id = ?2",
        params![entity.to_db_str(), record_id],
    )?;
    conn.execute(
        "INSERT INTO sync_outbox (entity, record_id, op, queued_at) VALUES (?1, ?2, ?3, ?4)",
        params![entity.to_db_str(), record_id, op.to_db_str(), now_millis()],
    )?;
    Ok(())
}

/// Oldest first.
pub fn pending(conn: &Connection) -> AppResult<Vec<OutboxEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, entity, record_id, op, queued_at FROM sync_outbox ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Pending entries per entity, in `Entity::ALL` order.
pub fn pending_counts(conn: &Connection) -> AppResult<Vec<(Entity, i64)>> {
    let mut out = Vec::new();
    for entity in Entity::ALL {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sync_outbox WHERE entity = ?1",
            [entity.to_db_str()],
            |row| row.get(0),
        )?;
        out.push((entity, n));
    }
    Ok(out)
}

/// Remove an acknowledged entry.
pub fn ack(conn: &Connection, id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM sync_outbox WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate::run_pending_migrations;

    fn conn() -> Connection {
        let c = Connection::open_in_memory().unwrap();
        run_pending_migrations(&c).unwrap();
        c
    }

    #[test]
    fn later_op_supersedes_earlier_one() {
        let c = conn();
        enqueue(&c, Entity::TimeBlock, "b1", SyncOp::Upsert).unwrap();
        enqueue(&c, Entity::Category, "c1", SyncOp::Upsert).unwrap();
        enqueue(&c, Entity::TimeBlock, "b1", SyncOp::Delete).unwrap();

        let p = pending(&c).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p[0].record_id, "c1");
        assert_eq!(p[1].op, SyncOp::Delete);
    }

    #[test]
    fn counts_cover_every_entity() {
        let c = conn();
        enqueue(&c, Entity::Achievement, "hours_50", SyncOp::Upsert).unwrap();
        let counts = pending_counts(&c).unwrap();
        assert_eq!(counts.len(), 4);
        assert!(counts.contains(&(Entity::Achievement, 1)));
        assert!(counts.contains(&(Entity::User, 0)));
    }
}
