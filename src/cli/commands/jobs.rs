use crate::cli::parser::{Commands, JobsAction};
use crate::config::Config;
use crate::core::jobs::{DeviceState, JobLogic, JobOutcome, JobRunner};
use crate::db::jobs::JobStatus;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};
use crate::utils::colors::{GREEN, RED, RESET, YELLOW};
use crate::utils::table::{Column, Table};
use crate::utils::time::{format_millis, now_millis};

use super::{open_pool, open_remote, signed_in_user};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Jobs { action } = cmd else {
        return Ok(());
    };
    let mut pool = open_pool(cfg)?;
    let now = now_millis();

    match action {
        JobsAction::Schedule => {
            let n = JobLogic::schedule_defaults(&pool.conn, now)?;
            if n == 0 {
                info("Periodic jobs already scheduled.");
            } else {
                success(format!("{n} periodic job(s) scheduled."));
            }
        }

        JobsAction::Run {
            offline,
            battery_low,
        } => {
            let user = signed_in_user(cfg)?;
            let remote = open_remote(cfg);
            let device = DeviceState {
                network_available: !offline,
                battery_low: *battery_low,
            };

            let reports = JobRunner::new(&mut pool, &remote, user.as_deref()).run_due(now, device)?;
            if reports.is_empty() {
                info("No jobs due.");
            }
            for r in reports {
                match r.outcome {
                    JobOutcome::Success => success(format!("{}: done", r.name)),
                    JobOutcome::Retry(e) => warning(format!("{}: will retry ({e})", r.name)),
                    JobOutcome::Failure(e) => warning(format!("{}: failed ({e})", r.name)),
                }
            }
        }

        JobsAction::List => {
            let jobs = JobLogic::list(&pool.conn)?;
            if jobs.is_empty() {
                info("No jobs scheduled.");
                return Ok(());
            }

            let mut table = Table::new(vec![
                Column::new("NAME", 26),
                Column::new("KIND", 9),
                Column::new("STATUS", 9),
                Column::new("NEXT RUN", 16),
                Column::new("TRIES", 5),
                Column::new("LAST ERROR", 30),
            ]);
            for j in jobs {
                let color = match j.status {
                    JobStatus::Succeeded => GREEN,
                    JobStatus::Failed => RED,
                    JobStatus::Retrying => YELLOW,
                    JobStatus::Enqueued => RESET,
                };
                table.add_row(vec![
                    j.name.clone(),
                    j.kind.to_db_str().to_string(),
                    format!("{color}{}{RESET}", j.status.to_db_str()),
                    format_millis(j.next_run_at),
                    j.attempts.to_string(),
                    j.last_error.unwrap_or_default(),
                ]);
            }
            print!("{}", table.render());
        }

        JobsAction::Cancel { name } => {
            JobLogic::cancel(&pool.conn, name)?;
            success(format!("Job '{name}' cancelled."));
        }

        JobsAction::CancelAll => {
            let n = JobLogic::cancel_all(&pool.conn)?;
            success(format!("{n} job(s) cancelled."));
        }
    }

    Ok(())
}
