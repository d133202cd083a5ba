use crate::cli::parser::{Commands, SyncAction};
use crate::config::Config;
use crate::core::sync::SyncLogic;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use crate::utils::time::{format_millis, now_millis};

use super::{open_pool, open_remote, signed_in_user};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Sync { action } = cmd else {
        return Ok(());
    };
    let user = signed_in_user(cfg)?;
    let mut pool = open_pool(cfg)?;
    let remote = open_remote(cfg);

    match action {
        SyncAction::Push => {
            let uid = user.as_deref().ok_or(AppError::NotSignedIn)?;
            let report = SyncLogic::push(&mut pool, &remote, Some(uid), now_millis())?;
            if report.pushed == 0 {
                info("Nothing to push.");
            } else {
                success(format!("Pushed {} change(s).", report.pushed));
            }
        }

        SyncAction::Pull => {
            let uid = user.as_deref().ok_or(AppError::NotSignedIn)?;
            let r = SyncLogic::pull(&mut pool, &remote, Some(uid))?;
            success(format!(
                "Pulled {} block(s), {} category(ies), {} achievement unlock(s){}.",
                r.time_blocks,
                r.categories,
                r.achievements_unlocked,
                if r.profile { ", profile restored" } else { "" }
            ));
            if r.skipped > 0 {
                warning(format!("{} remote record(s) skipped.", r.skipped));
            }
        }

        SyncAction::Status => {
            let status = SyncLogic::status(&pool, user.as_deref())?;
            println!(
                "Account   : {}",
                user.as_deref().unwrap_or("not signed in")
            );
            println!("Pending   : {} change(s)", status.total_pending());
            for (entity, n) in &status.pending {
                println!("  - {:<12} {n}", entity.to_db_str());
            }
            let last = status
                .last_sync_time
                .map(format_millis)
                .unwrap_or_else(|| "never".into());
            println!("Last sync : {last}");
        }
    }

    Ok(())
}
