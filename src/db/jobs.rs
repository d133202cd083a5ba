//! `jobs` table access: persisted schedule of background work.

use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, Row, params};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Periodic,
    OneShot,
}

impl JobKind {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            JobKind::Periodic => "periodic",
            JobKind::OneShot => "one_shot",
        }
    }

    pub fn from_db_str(s: &str) -> AppResult<Self> {
        match s {
            "periodic" => Ok(JobKind::Periodic),
            "one_shot" => Ok(JobKind::OneShot),
            other => Err(AppError::unknown_variant("job kind", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Enqueued,
    Succeeded,
    Failed,
    Retrying,
}

impl JobStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            JobStatus::Enqueued => "enqueued",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Retrying => "retrying",
        }
    }

    pub fn from_db_str(s: &str) -> AppResult<Self> {
        match s {
            "enqueued" => Ok(JobStatus::Enqueued),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" => Ok(JobStatus::Failed),
            "retrying" => Ok(JobStatus::Retrying),
            other => Err(AppError::unknown_variant("job status", other)),
        }
    }
}

/// What happens when a job with the same name is already scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueuePolicy {
    Keep,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub name: String,
    pub kind: JobKind,
    pub interval_ms: Option<i64>,
    pub next_run_at: i64,
    pub requires_network: bool,
    pub requires_battery_not_low: bool,
    pub status: JobStatus,
    pub attempts: i32,
    pub last_run_at: Option<i64>,
    pub last_error: Option<String>,
}

impl JobRecord {
    pub fn is_due(&self, now: i64) -> bool {
        self.next_run_at <= now
    }
}

fn map_row(row: &Row) -> rusqlite::Result<JobRecord> {
    let kind: String = row.get("kind")?;
    let status: String = row.get("status")?;
    Ok(JobRecord {
        name: row.get("name")?,
        kind: JobKind::from_db_str(&kind).map_err(|e| e.into_sql(1))?,
        interval_ms: row.get("interval_ms")?,
        next_run_at: row.get("next_run_at")?,
        requires_network: row.get("requires_network")?,
        requires_battery_not_low: row.get("requires_battery_not_low")?,
        status: JobStatus::from_db_str(&status).map_err(|e| e.into_sql(6))?,
        attempts: row.get("attempts")?,
        last_run_at: row.get("last_run_at")?,
        last_error: row.get("last_error")?,
    })
}

const SELECT: &str = "SELECT name, kind, interval_ms, next_run_at, requires_network,
        requires_battery_not_low, status, attempts, last_run_at, last_error
     FROM jobs";

/// Schedule a job. Returns `false` when `Keep` left an existing one in place.
pub fn enqueue(conn: &Connection, job: &JobRecord, policy: EnqueuePolicy) -> AppResult<bool> {
    let verb = match policy {
        EnqueuePolicy::Keep => "INSERT OR IGNORE",
        EnqueuePolicy::Replace => "INSERT OR REPLACE",
    };
    let sql = format!(
        "{verb} INTO jobs (name, kind, interval_ms, next_run_at, requires_network,
                           requires_battery_not_low, status, attempts, last_run_at, last_error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
    );
    let n = conn.execute(
        &sql,
        params![
            job.name,
            job.kind.to_db_str(),
            job.interval_ms,
            job.next_run_at,
            job.requires_network,
            job.requires_battery_not_low,
            job.status.to_db_str(),
            job.attempts,
            job.last_run_at,
            job.last_error,
        ],
    )?;
    Ok(n > 0)
}

pub fn get_job(conn: &Connection, name: &str) -> AppResult<Option<JobRecord>> {
    let sql = format!("{SELECT} WHERE name = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([name], map_row).optional()?)
}

/// All jobs by next run.
pub fn list_jobs(conn: &Connection) -> AppResult<Vec<JobRecord>> {
    let sql = format!("{SELECT} ORDER BY next_run_at ASC, name ASC");
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn due_jobs(conn: &Connection, now: i64) -> AppResult<Vec<JobRecord>> {
    Ok(list_jobs(conn)?
        .into_iter()
        .filter(|j| j.is_due(now))
        .collect())
}

/// Store the outcome of a run.
pub fn record_run(conn: &Connection, job: &JobRecord) -> AppResult<()> {
    conn.execute(
        "UPDATE jobs
         SET next_run_at = ?2, status = ?3, attempts = ?4, last_run_at = ?5, last_error = ?6
         WHERE name = ?1",
        params![
            job.name,
            job.next_run_at,
            job.status.to_db_str(),
            job.attempts,
            job.last_run_at,
            job.last_error,
        ],
    )?;
    Ok(())
}

/// Returns `true` when a job was removed.
pub fn delete_job(conn: &Connection, name: &str) -> AppResult<bool> {
    Ok(conn.execute("DELETE FROM jobs WHERE name = ?1", [name])? > 0)
}

pub fn delete_all(conn: &Connection) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM jobs", [])?)
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

    fn job(name: &str, next: i64) -> JobRecord {
        JobRecord {
            name: name.into(),
            kind: JobKind::OneShot,
            interval_ms: None,
            next_run_at: next,
            requires_network: true,
            requires_battery_not_low: false,
            status: JobStatus::Enqueued,
            attempts: 0,
            last_run_at: None,
            last_error: None,
        }
    }

    #[test]
    fn keep_leaves_existing_schedule() {
        let c = conn();
        assert!(enqueue(&c, &job("a", 10), EnqueuePolicy::Keep).unwrap());
        assert!(!enqueue(&c, &job("a", 99), EnqueuePolicy::Keep).unwrap());
        assert_eq!(get_job(&c, "a").unwrap().unwrap().next_run_at, 10);
    }

    #[test]
    fn replace_overwrites_schedule() {
        let c = conn();
        enqueue(&c, &job("a", 10), EnqueuePolicy::Replace).unwrap();
        enqueue(&c, &job("a", 99), EnqueuePolicy::Replace).unwrap();
        assert_eq!(get_job(&c, "a").unwrap().unwrap().next_run_at, 99);
        assert_eq!(list_jobs(&c).unwrap().len(), 1);
    }

    #[test]
    fn due_filters_by_time() {
        let c = conn();
        enqueue(&c, &job("early", 10), EnqueuePolicy::Keep).unwrap();
        enqueue(&c, &job("late", 100), EnqueuePolicy::Keep).unwrap();
        let due: Vec<_> = due_jobs(&c, 50).unwrap().into_iter().map(|j| j.name).collect();
        assert_eq!(due, ["early"]);
        assert!(delete_job(&c, "early").unwrap());
        assert_eq!(delete_all(&c).unwrap(), 1);
    }
}
