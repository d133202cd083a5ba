use crate::cli::parser::{AchievementAction, Commands};
use crate::config::Config;
use crate::core::achievements::AchievementLogic;
use crate::errors::AppResult;
use crate::models::{Achievement, AchievementType};
use crate::ui::messages::{info, success};
use crate::utils::colors::{GREY, RESET, hex_swatch};
use crate::utils::date::today;
use crate::utils::formatting::{progress_bar, wrap_indented};
use crate::utils::table::{Column, Table};
use crate::utils::time::now_millis;

use super::{open_pool, sync_after_write};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Achievement { action } = cmd else {
        return Ok(());
    };
    let mut pool = open_pool(cfg)?;

    match action {
        AchievementAction::List { unlocked, kind } => {
            let list = match (unlocked, kind) {
                (_, Some(k)) => {
                    let mut list = AchievementLogic::get_by_type(&pool, AchievementType::from_db_str(k)?)?;
                    if *unlocked {
                        list.retain(|a| a.is_unlocked);
                    }
                    list
                }
                (true, None) => AchievementLogic::unlocked(&pool)?,
                (false, None) => AchievementLogic::list(&pool)?,
            };
            print_achievements(&list);
            let total = AchievementLogic::list(&pool)?.len();
            println!(
                "\nUnlocked {}/{}",
                AchievementLogic::unlocked_count(&pool)?,
                total
            );
            return Ok(());
        }

        AchievementAction::Show { id } => {
            let a = AchievementLogic::get(&pool, id)?;
            print_achievements(std::slice::from_ref(&a));
            if !a.description.is_empty() {
                println!("\n{}", wrap_indented(&a.description, 72, ""));
            }
            return Ok(());
        }

        AchievementAction::Evaluate => {
            let unlocked = AchievementLogic::evaluate(&mut pool, today(), now_millis())?;
            if unlocked.is_empty() {
                info("No new achievements.");
            }
            for id in &unlocked {
                let a = AchievementLogic::get(&pool, id)?;
                success(format!("🏆 Unlocked: {} ({})", a.title, a.rarity.to_db_str()));
            }
        }

        AchievementAction::Unlock { id } => {
            if AchievementLogic::unlock(&mut pool, id, now_millis())? {
                success(format!("Achievement '{id}' unlocked."));
            } else {
                info(format!("Achievement '{id}' was already unlocked."));
            }
        }

        AchievementAction::Progress { id, value } => {
            AchievementLogic::update_progress(&mut pool, id, *value)?;
            let a = AchievementLogic::get(&pool, id)?;
            success(format!(
                "Progress of '{}' is {}/{}",
                a.title, a.progress, a.max_progress
            ));
        }
    }

    sync_after_write(&mut pool, cfg);
    Ok(())
}

fn print_achievements(list: &[Achievement]) {
    if list.is_empty() {
        info("No achievements found.");
        return;
    }

    let mut table = Table::new(vec![
        Column::new("", 2),
        Column::new("ID", 16),
        Column::new("TITLE", 24),
        Column::new("RARITY", 12),
        Column::new("PROGRESS", 24),
    ]);
    for a in list {
        let mark = if a.is_unlocked { "🏆" } else { "🔒" };
        let rarity = match hex_swatch(a.rarity.color_hex()) {
            Some(sw) => format!("{sw}{RESET} {}", a.rarity.to_db_str()),
            None => a.rarity.to_db_str().to_string(),
        };
        let title = if a.is_unlocked {
            a.title.clone()
        } else {
            format!("{GREY}{}{RESET}", a.title)
        };
        table.add_row(vec![
            mark.to_string(),
            a.id.clone(),
            title,
            rarity,
            format!(
                "{} {}/{}",
                progress_bar(a.progress_percent(), 10),
                a.progress,
                a.max_progress
            ),
        ]);
    }
    print!("{}", table.render());
}
