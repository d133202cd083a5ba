use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::user::UserLogic;
use crate::errors::{AppError, AppResult};
use crate::models::{Theme, UserSettings};
use crate::ui::messages::success;
use crate::utils::formatting::bold;
use crate::utils::time::format_millis;

use super::{open_pool, signed_in_user, sync_after_write};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Settings {
        premium,
        theme,
        language,
        notifications,
        max_categories,
    } = cmd
    else {
        return Ok(());
    };

    let uid = signed_in_user(cfg)?.ok_or(AppError::NotSignedIn)?;
    let mut pool = open_pool(cfg)?;
    let mut changed = false;

    if let Some(p) = premium {
        UserLogic::set_premium(&mut pool, &uid, *p)?;
        success(if *p { "Premium enabled." } else { "Premium disabled." });
        changed = true;
    }
    if let Some(t) = theme {
        UserLogic::update_theme(&mut pool, &uid, Theme::from_db_str(t)?)?;
        success(format!("Theme set to {t}."));
        changed = true;
    }
    if let Some(lang) = language {
        UserLogic::update_language(&mut pool, &uid, lang)?;
        success(format!("Language set to {lang}."));
        changed = true;
    }
    if let Some(n) = notifications {
        UserLogic::update_notifications(&mut pool, &uid, *n)?;
        success(if *n { "Notifications on." } else { "Notifications off." });
        changed = true;
    }
    if let Some(max) = max_categories {
        UserLogic::update_max_categories(&mut pool, &uid, *max)?;
        success(format!("Category limit set to {max}."));
        changed = true;
    }

    if changed {
        sync_after_write(&mut pool, cfg);
    } else {
        print_settings(&UserLogic::get(&pool, &uid)?);
    }
    Ok(())
}

fn print_settings(s: &UserSettings) {
    println!("{}", bold(&format!("Settings for {}", s.user_id)));
    println!("  theme          : {}", s.theme.to_db_str());
    println!("  language       : {}", s.language);
    println!("  notifications  : {}", if s.notifications_enabled { "on" } else { "off" });
    println!("  tier           : {}", if s.is_premium { "premium" } else { "free" });
    println!("  categories     : up to {}", s.category_limit_text());
    println!(
        "  last sync      : {}",
        s.last_sync_time.map(format_millis).unwrap_or_else(|| "never".into())
    );
}
