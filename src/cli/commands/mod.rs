//! One handler per subcommand, plus the wiring they share.

pub mod achievement;
pub mod auth;
pub mod backup;
pub mod block;
pub mod category;
pub mod config;
pub mod db;
pub mod init;
pub mod jobs;
pub mod log;
pub mod settings;
pub mod stats;
pub mod sync;

use crate::config::Config;
use crate::core::sync::SyncLogic;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::remote::{AuthProvider, FileRemote, LocalAuth};
use crate::ui::messages::warning;
use crate::utils::time::now_millis;

pub(crate) fn open_pool(cfg: &Config) -> AppResult<DbPool> {
    DbPool::new(&cfg.database)
}

pub(crate) fn open_auth(cfg: &Config) -> AppResult<LocalAuth> {
    LocalAuth::open(&cfg.remote_root(), &Config::config_dir())
}

pub(crate) fn open_remote(cfg: &Config) -> FileRemote {
    FileRemote::new(cfg.remote_root())
}

pub(crate) fn signed_in_user(cfg: &Config) -> AppResult<Option<String>> {
    Ok(open_auth(cfg)?.current_user_id())
}

/// Push after a mutation when `sync_on_write` is on. A failed push only warns:
/// the change stays in the outbox for the next run.
pub(crate) fn sync_after_write(pool: &mut DbPool, cfg: &Config) {
    if !cfg.sync_on_write {
        return;
    }

    let user = match signed_in_user(cfg) {
        Ok(Some(uid)) => uid,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(error = %e, "cannot read session, skipping sync");
            return;
        }
    };

    let remote = open_remote(cfg);
    if let Err(e) = SyncLogic::push(pool, &remote, Some(&user), now_millis()) {
        tracing::warn!(error = %e, "sync after write failed");
        warning(format!("Sync failed, changes stay queued: {e}"));
    }
}
