use crate::cli::parser::{Commands, StatsAction};
use crate::config::Config;
use crate::core::categories::CategoryLogic;
use crate::core::statistics::StatisticsLogic;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::StatisticsData;
use crate::ui::messages::header;
use crate::utils::date::{months_before, resolve_period, today, weeks_before, years_before};
use crate::utils::formatting::{bold, category_label, hours_readable, mins2readable, progress_bar};
use crate::utils::table::{Column, Table};
use chrono::NaiveDate;

use super::open_pool;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Stats { action } = cmd else {
        return Ok(());
    };
    let pool = open_pool(cfg)?;
    let now = today();

    match action {
        StatsAction::Today => {
            let t = StatisticsLogic::today(&pool.conn, now)?;
            header(format!("Today {now}"));
            println!("Blocks     : {}/{} completed", t.completed_blocks, t.total_blocks);
            println!(
                "Completion : {} {}%",
                progress_bar(i32::try_from(t.completion_rate).unwrap_or(0), 20),
                t.completion_rate
            );
            println!("Tracked    : {}", mins2readable(t.total_minutes, false, false));
        }
        StatsAction::Week => {
            let data = StatisticsLogic::weekly(&pool.conn, now)?;
            print_range(&pool, "Last week", weeks_before(now, 1), now, &data)?;
        }
        StatsAction::Month => {
            let data = StatisticsLogic::monthly(&pool.conn, now)?;
            print_range(&pool, "Last month", months_before(now, 1), now, &data)?;
        }
        StatsAction::Year => {
            let data = StatisticsLogic::yearly(&pool.conn, now)?;
            print_range(&pool, "Last year", years_before(now, 1), now, &data)?;
        }
        StatsAction::Range { period } => {
            let (from, to) = resolve_period(period)?;
            let data = StatisticsLogic::for_range(&pool.conn, from, to)?;
            print_range(&pool, "Period", from, to, &data)?;
        }
        StatsAction::Streak => {
            let current = StatisticsLogic::current_streak(&pool.conn, now)?;
            let best = StatisticsLogic::max_streak(&pool.conn)?;
            println!("🔥 Current streak : {current} day(s)");
            println!("🏅 Longest streak : {best} day(s)");
        }
    }

    Ok(())
}

fn print_range(
    pool: &DbPool,
    title: &str,
    from: NaiveDate,
    to: NaiveDate,
    data: &StatisticsData,
) -> AppResult<()> {
    header(format!("{title} ({from} → {to})"));
    println!("Total tracked    : {}", bold(&hours_readable(data.total_hours)));
    println!("Completed blocks : {}", data.completed_blocks);

    if data.category_stats.is_empty() {
        return Ok(());
    }

    let total_minutes: f64 = data.category_stats.iter().map(|c| c.total_minutes).sum();
    let mut table = Table::new(vec![
        Column::new("CATEGORY", 24),
        Column::new("BLOCKS", 6),
        Column::new("TIME", 9),
        Column::new("SHARE", 20),
    ]);

    for stat in &data.category_stats {
        let label = match CategoryLogic::get(pool, &stat.category_id) {
            Ok(c) => category_label(&c.icon, &c.name, &c.color),
            Err(_) => stat.category_id.clone(),
        };
        let share = if total_minutes > 0.0 {
            (stat.total_minutes * 100.0 / total_minutes).round() as i32
        } else {
            0
        };
        table.add_row(vec![
            label,
            stat.count.to_string(),
            mins2readable(stat.total_minutes.round() as i64, false, false),
            format!("{} {share}%", progress_bar(share, 12)),
        ]);
    }

    println!();
    print!("{}", table.render());
    Ok(())
}
