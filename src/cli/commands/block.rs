use crate::cli::parser::{BlockAction, Commands};
use crate::config::Config;
use crate::core::blocks::{BlockChanges, BlockLogic, NewBlock};
use crate::core::categories::CategoryLogic;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::{Category, TimeBlock};
use crate::ui::messages::{info, success};
use crate::utils::colors::{RESET, color_for_status, colorize_optional};
use crate::utils::date::{parse_date_arg, resolve_period, today, weekday_str};
use crate::utils::formatting::{bold, category_label, mins2readable, wrap_indented};
use crate::utils::table::{Column, Table};
use crate::utils::time::{parse_optional_time, parse_time_arg, time_to_db};
use chrono::{Local, NaiveDate, NaiveTime};
use std::collections::HashMap;

use super::{open_pool, sync_after_write};

fn date_or_today(arg: Option<&String>) -> AppResult<NaiveDate> {
    arg.map(|d| parse_date_arg(d)).transpose().map(|d| d.unwrap_or_else(today))
}

fn time_or_now(arg: Option<&String>) -> AppResult<NaiveTime> {
    Ok(parse_optional_time(arg)?.unwrap_or_else(|| Local::now().time()))
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Block { action } = cmd else {
        return Ok(());
    };
    let mut pool = open_pool(cfg)?;

    match action {
        BlockAction::Add {
            title,
            start,
            end,
            category,
            date,
            description,
        } => {
            let key = category.as_deref().unwrap_or(&cfg.default_category);
            let cat = CategoryLogic::resolve(&pool, key)?;
            let block = BlockLogic::create(
                &mut pool,
                NewBlock {
                    title: title.clone(),
                    description: description.clone(),
                    start: parse_time_arg(start)?,
                    end: parse_time_arg(end)?,
                    category_id: cat.id,
                    date: date_or_today(date.as_ref())?,
                },
            )?;
            success(format!(
                "Block '{}' planned on {} {}-{} [{}]",
                block.title,
                block.date,
                time_to_db(block.start_time),
                time_to_db(block.end_time),
                short_id(&block.id)
            ));
        }

        BlockAction::Edit {
            id,
            title,
            description,
            start,
            end,
            category,
            date,
        } => {
            let block = BlockLogic::resolve(&pool, id)?;
            let category_id = match category {
                Some(key) => Some(CategoryLogic::resolve(&pool, key)?.id),
                None => None,
            };
            let changes = BlockChanges {
                title: title.clone(),
                description: description.clone(),
                start: parse_optional_time(start.as_ref())?,
                end: parse_optional_time(end.as_ref())?,
                category_id,
                date: date.as_ref().map(|d| parse_date_arg(d)).transpose()?,
            };
            let block = BlockLogic::update(&mut pool, &block.id, changes)?;
            success(format!("Block '{}' updated.", block.title));
        }

        BlockAction::Start { id, at } => {
            let block = BlockLogic::resolve(&pool, id)?;
            let block = BlockLogic::start(&mut pool, &block.id, time_or_now(at.as_ref())?)?;
            success(format!(
                "Started '{}' at {}",
                block.title,
                block.actual_start_time.map(time_to_db).unwrap_or_default()
            ));
        }

        BlockAction::Done { id, at } => {
            let block = BlockLogic::resolve(&pool, id)?;
            let block = BlockLogic::complete(&mut pool, &block.id, time_or_now(at.as_ref())?)?;
            let spent = block.actual_duration().unwrap_or(0);
            success(format!(
                "Completed '{}' ({})",
                block.title,
                mins2readable(spent, false, false)
            ));
        }

        BlockAction::SetStart { id, time } => {
            let block = BlockLogic::resolve(&pool, id)?;
            BlockLogic::set_actual_start(&mut pool, &block.id, parse_time_arg(time)?)?;
            success(format!("Actual start of '{}' set to {}", block.title, time));
        }

        BlockAction::SetEnd { id, time } => {
            let block = BlockLogic::resolve(&pool, id)?;
            BlockLogic::set_actual_end(&mut pool, &block.id, parse_time_arg(time)?)?;
            success(format!("Actual end of '{}' set to {}", block.title, time));
        }

        BlockAction::Del { id } => {
            let block = BlockLogic::resolve(&pool, id)?;
            BlockLogic::delete(&mut pool, &block.id)?;
            success(format!("Block '{}' deleted.", block.title));
        }

        BlockAction::Purge { date } => {
            let date = parse_date_arg(date)?;
            let n = BlockLogic::purge_date(&mut pool, date)?;
            success(format!("Deleted {n} block(s) on {date}."));
        }

        BlockAction::Show { id } => {
            let block = BlockLogic::resolve(&pool, id)?;
            print_block(&pool, &block)?;
            return Ok(());
        }

        BlockAction::List {
            date,
            period,
            completed,
        } => {
            let blocks = match period {
                Some(p) => {
                    let (from, to) = resolve_period(p)?;
                    let mut blocks = BlockLogic::range(&pool, from, to)?;
                    if *completed {
                        blocks.retain(|b| b.is_completed);
                    }
                    blocks
                }
                None => {
                    let d = date_or_today(date.as_ref())?;
                    if *completed {
                        BlockLogic::completed_for_date(&pool, d)?
                    } else {
                        BlockLogic::daily(&pool, d)?
                    }
                }
            };
            print_blocks(&pool, &blocks)?;
            return Ok(());
        }

        BlockAction::Active { date, at } => {
            let d = date_or_today(date.as_ref())?;
            let blocks = BlockLogic::active_at(&pool, d, time_or_now(at.as_ref())?)?;
            print_blocks(&pool, &blocks)?;
            return Ok(());
        }
    }

    sync_after_write(&mut pool, cfg);
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn category_map(pool: &DbPool) -> AppResult<HashMap<String, Category>> {
    Ok(CategoryLogic::list(pool)?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect())
}

fn label_for(categories: &HashMap<String, Category>, id: &str) -> String {
    categories
        .get(id)
        .map(|c| category_label(&c.icon, &c.name, &c.color))
        .unwrap_or_else(|| id.to_string())
}

fn status_text(b: &TimeBlock) -> String {
    let color = color_for_status(b.is_completed, b.is_started());
    let text = if b.is_completed {
        "done"
    } else if b.is_started() {
        "running"
    } else {
        "planned"
    };
    format!("{color}{text}{RESET}")
}

fn actual_window(b: &TimeBlock) -> String {
    let s = b.actual_start_time.map(time_to_db).unwrap_or_else(|| "--:--".into());
    let e = b.actual_end_time.map(time_to_db).unwrap_or_else(|| "--:--".into());
    format!("{}-{}", colorize_optional(&s), colorize_optional(&e))
}

fn print_blocks(pool: &DbPool, blocks: &[TimeBlock]) -> AppResult<()> {
    if blocks.is_empty() {
        info("No time blocks found.");
        return Ok(());
    }

    let categories = category_map(pool)?;
    let mut table = Table::new(vec![
        Column::new("ID", 8),
        Column::new("DATE", 14),
        Column::new("PLANNED", 11),
        Column::new("ACTUAL", 11),
        Column::new("CATEGORY", 18),
        Column::new("STATUS", 8),
        Column::new("TITLE", 30),
    ]);

    let mut planned = 0;
    let mut spent = 0;
    for b in blocks {
        planned += b.duration();
        spent += b.actual_duration().unwrap_or(0);
        table.add_row(vec![
            short_id(&b.id).to_string(),
            format!("{} {}", b.date, weekday_str(b.date)),
            format!("{}-{}", time_to_db(b.start_time), time_to_db(b.end_time)),
            actual_window(b),
            label_for(&categories, &b.category_id),
            status_text(b),
            b.title.clone(),
        ]);
    }

    print!("{}", table.render());
    println!(
        "\n{} planned {} · tracked {}",
        bold(&format!("{} block(s)", blocks.len())),
        mins2readable(planned, false, false),
        mins2readable(spent, false, false)
    );
    Ok(())
}

fn print_block(pool: &DbPool, b: &TimeBlock) -> AppResult<()> {
    let categories = category_map(pool)?;

    println!("{}", bold(&b.title));
    println!("  id        : {}", b.id);
    println!("  date      : {} {}", b.date, weekday_str(b.date));
    println!(
        "  planned   : {}-{} ({})",
        time_to_db(b.start_time),
        time_to_db(b.end_time),
        mins2readable(b.duration(), false, false)
    );
    println!("  actual    : {}", actual_window(b));
    println!("  category  : {}", label_for(&categories, &b.category_id));
    println!("  status    : {} ({}%)", status_text(b), b.completion_percent());
    if let Some(desc) = &b.description {
        println!("  notes     :");
        println!("{}", wrap_indented(desc, 72, "    "));
    }
    Ok(())
}
