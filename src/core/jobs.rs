//! Persisted background work.
//!
//! Jobs live in the `jobs` table so a schedule survives between runs of the
//! binary. `JobRunner::run_due` is the only place that executes them.

use crate::core::achievements::AchievementLogic;
use crate::core::statistics::StatisticsLogic;
use crate::core::sync::SyncLogic;
use crate::db::jobs::{self as repo, EnqueuePolicy, JobKind, JobRecord, JobStatus};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::remote::RemoteStore;
use chrono::{DateTime, Local, NaiveDate};
use rusqlite::Connection;

pub const ACHIEVEMENT_CHECK: &str = "achievement_check";
pub const STATISTICS_CALCULATION: &str = "statistics_calculation";
pub const SYNC_DATA: &str = "sync_data";
pub const DELAYED_ACHIEVEMENT_CHECK: &str = "delayed_achievement_check";

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const BACKOFF_BASE_MS: i64 = 30_000;
const BACKOFF_MAX_MS: i64 = 5 * HOUR_MS;

struct PeriodicJob {
    name: &'static str,
    interval_ms: i64,
    initial_delay_ms: i64,
    requires_network: bool,
    requires_battery_not_low: bool,
}

const PERIODIC: [PeriodicJob; 3] = [
    PeriodicJob {
        name: ACHIEVEMENT_CHECK,
        interval_ms: 24 * HOUR_MS,
        initial_delay_ms: HOUR_MS,
        requires_network: true,
        requires_battery_not_low: true,
    },
    PeriodicJob {
        name: STATISTICS_CALCULATION,
        interval_ms: 12 * HOUR_MS,
        initial_delay_ms: 30 * MINUTE_MS,
        requires_network: false,
        requires_battery_not_low: true,
    },
    PeriodicJob {
        name: SYNC_DATA,
        interval_ms: 6 * HOUR_MS,
        initial_delay_ms: HOUR_MS,
        requires_network: true,
        requires_battery_not_low: true,
    },
];

const DELAYED_CHECK_DELAY_MS: i64 = 15 * MINUTE_MS;

/// Device conditions the job constraints are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    pub network_available: bool,
    pub battery_low: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            network_available: true,
            battery_low: false,
        }
    }
}

impl DeviceState {
    pub fn allows(&self, job: &JobRecord) -> bool {
        (!job.requires_network || self.network_available)
            && (!job.requires_battery_not_low || !self.battery_low)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    /// Not worth retrying (no signed-in user).
    Failure(String),
    /// Transient error, retried with backoff.
    Retry(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub name: String,
    pub outcome: JobOutcome,
}

/// Delay before retry number `attempts` (1-based): 30 s doubling, capped at 5 h.
pub fn backoff_ms(attempts: i32) -> i64 {
    let exp = (attempts - 1).clamp(0, 30) as u32;
    BACKOFF_BASE_MS
        .saturating_mul(1_i64 << exp)
        .min(BACKOFF_MAX_MS)
}

fn local_date(now: i64) -> NaiveDate {
    DateTime::from_timestamp_millis(now)
        .map(|dt| dt.with_timezone(&Local).date_naive())
        .unwrap_or_else(crate::utils::date::today)
}

pub struct JobLogic;

impl JobLogic {
    /// Schedule the periodic jobs; already scheduled ones are kept.
    pub fn schedule_defaults(conn: &Connection, now: i64) -> AppResult<usize> {
        let mut added = 0;
        for p in &PERIODIC {
            let job = JobRecord {
                name: p.name.to_string(),
                kind: JobKind::Periodic,
                interval_ms: Some(p.interval_ms),
                next_run_at: now + p.initial_delay_ms,
                requires_network: p.requires_network,
                requires_battery_not_low: p.requires_battery_not_low,
                status: JobStatus::Enqueued,
                attempts: 0,
                last_run_at: None,
                last_error: None,
            };
            if repo::enqueue(conn, &job, EnqueuePolicy::Keep)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// One-shot check 15 minutes from `now`, replacing a pending one.
    pub fn schedule_delayed_achievement_check(conn: &Connection, now: i64) -> AppResult<()> {
        let job = JobRecord {
            name: DELAYED_ACHIEVEMENT_CHECK.to_string(),
            kind: JobKind::OneShot,
            interval_ms: None,
            next_run_at: now + DELAYED_CHECK_DELAY_MS,
            requires_network: true,
            requires_battery_not_low: false,
            status: JobStatus::Enqueued,
            attempts: 0,
            last_run_at: None,
            last_error: None,
        };
        repo::enqueue(conn, &job, EnqueuePolicy::Replace)?;
        Ok(())
    }

    pub fn list(conn: &Connection) -> AppResult<Vec<JobRecord>> {
        repo::list_jobs(conn)
    }

    pub fn cancel(conn: &Connection, name: &str) -> AppResult<()> {
        if !repo::delete_job(conn, name)? {
            return Err(AppError::not_found("Job", name));
        }
        Ok(())
    }

    pub fn cancel_all(conn: &Connection) -> AppResult<usize> {
        repo::delete_all(conn)
    }
}

pub struct JobRunner<'a> {
    pool: &'a mut DbPool,
    remote: &'a dyn RemoteStore,
    user_id: Option<&'a str>,
}

impl<'a> JobRunner<'a> {
    pub fn new(pool: &'a mut DbPool, remote: &'a dyn RemoteStore, user_id: Option<&'a str>) -> Self {
        Self {
            pool,
            remote,
            user_id,
        }
    }

    /// Run every due job whose constraints `device` satisfies.
    pub fn run_due(&mut self, now: i64, device: DeviceState) -> AppResult<Vec<JobReport>> {
        let mut reports = Vec::new();

        for job in repo::due_jobs(&self.pool.conn, now)? {
            if !device.allows(&job) {
                tracing::debug!(job = %job.name, "constraints not met, postponed");
                continue;
            }

            let outcome = self.execute(&job.name, now);
            self.settle(job.clone(), &outcome, now)?;
            reports.push(JobReport {
                name: job.name,
                outcome,
            });
        }
        Ok(reports)
    }

    fn execute(&mut self, name: &str, now: i64) -> JobOutcome {
        let Some(uid) = self.user_id else {
            return JobOutcome::Failure(AppError::NotSignedIn.to_string());
        };

        let result = match name {
            ACHIEVEMENT_CHECK | DELAYED_ACHIEVEMENT_CHECK => {
                AchievementLogic::evaluate(self.pool, local_date(now), now).map(|ids| {
                    format!("{} achievement(s) unlocked", ids.len())
                })
            }
            STATISTICS_CALCULATION => self.calculate_statistics(now),
            SYNC_DATA => SyncLogic::push(self.pool, self.remote, Some(uid), now)
                .map(|r| format!("{} change(s) pushed", r.pushed)),
            other => return JobOutcome::Failure(format!("unknown job '{other}'")),
        };

        match result {
            Ok(summary) => {
                tracing::debug!(job = name, %summary, "job succeeded");
                JobOutcome::Success
            }
            Err(e) => {
                tracing::warn!(job = name, error = %e, "job failed, will retry");
                JobOutcome::Retry(e.to_string())
            }
        }
    }

    fn calculate_statistics(&mut self, now: i64) -> AppResult<String> {
        let conn = &self.pool.conn;
        let today = local_date(now);
        let streak = StatisticsLogic::current_streak(conn, today)?;
        let week = StatisticsLogic::weekly(conn, today)?;
        let summary = format!(
            "streak {streak} day(s), {:.1}h and {} completed block(s) this week",
            week.total_hours, week.completed_blocks
        );
        ttlog_quiet(conn, "statistics", "", &summary);
        Ok(summary)
    }

    /// Persist the outcome: reschedule, back off, or drop the job.
    fn settle(&mut self, mut job: JobRecord, outcome: &JobOutcome, now: i64) -> AppResult<()> {
        let conn = &self.pool.conn;
        job.last_run_at = Some(now);

        match outcome {
            JobOutcome::Success => {
                job.status = JobStatus::Succeeded;
                job.attempts = 0;
                job.last_error = None;
            }
            JobOutcome::Failure(msg) => {
                job.status = JobStatus::Failed;
                job.last_error = Some(msg.clone());
                ttlog_quiet(conn, "job_failed", &job.name, msg);
            }
            JobOutcome::Retry(msg) => {
                job.status = JobStatus::Retrying;
                job.attempts += 1;
                job.last_error = Some(msg.clone());
                job.next_run_at = now + backoff_ms(job.attempts);
                return repo::record_run(conn, &job);
            }
        }

        match (job.kind, job.interval_ms) {
            (JobKind::Periodic, Some(interval)) => {
                job.next_run_at = now + interval;
                repo::record_run(conn, &job)
            }
            _ => {
                repo::delete_job(conn, &job.name)?;
                Ok(())
            }
        }
    }
}
