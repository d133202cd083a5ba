use crate::db::log::{LogEntry, load_log};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::utils::formatting::strip_ansi;
use ansi_term::Colour;

const MAX_OP_WIDTH: usize = 60;

/// ANSI colour for an audit operation.
fn color_for_operation(op: &str) -> Colour {
    match op {
        "add" | "category_add" | "sign_up" => Colour::Green,
        "del" | "category_del" | "job_failed" => Colour::Red,
        "edit" | "category_edit" | "start" => Colour::Yellow,
        "complete" | "unlock" => Colour::Cyan,
        "migration_applied" | "config_migrate" => Colour::Purple,
        "backup" | "sync_push" | "sync_pull" => Colour::Blue,
        "init" | "premium" => Colour::RGB(255, 153, 51), // orange
        _ => Colour::White,
    }
}

/// `operation (target)`, truncated to [`MAX_OP_WIDTH`] visible chars with
/// only the operation word coloured.
fn render_op_target(entry: &LogEntry) -> String {
    let plain = if entry.target.is_empty() {
        entry.operation.clone()
    } else {
        format!("{} ({})", entry.operation, entry.target)
    };

    let visible = if plain.chars().count() > MAX_OP_WIDTH {
        let mut s: String = plain.chars().take(MAX_OP_WIDTH - 3).collect();
        s.push_str("...");
        s
    } else {
        plain
    };

    let color = color_for_operation(&entry.operation);
    match visible.split_once(' ') {
        Some((op, rest)) => format!("{} {}", color.paint(op), rest),
        None => color.paint(visible.as_str()).to_string(),
    }
}

pub struct LogLogic;

impl LogLogic {
    pub fn print_log(pool: &DbPool) -> AppResult<()> {
        let entries = load_log(&pool.conn)?;
        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let rendered: Vec<String> = entries.iter().map(render_op_target).collect();
        let op_w = rendered
            .iter()
            .map(|r| strip_ansi(r).chars().count())
            .max()
            .unwrap_or(10)
            .min(MAX_OP_WIDTH);
        let id_w = entries
            .iter()
            .map(|e| e.id.to_string().len())
            .max()
            .unwrap_or(1);

        println!("📜 Internal log:\n");

        for (entry, op_target) in entries.iter().zip(rendered) {
            let date = chrono::DateTime::parse_from_rfc3339(&entry.date)
                .map(|dt| dt.format("%FT%T%:z").to_string())
                .unwrap_or_else(|_| entry.date.clone());

            // padding on the visible width, ANSI codes excluded
            let padding = " ".repeat(op_w.saturating_sub(strip_ansi(&op_target).chars().count()));

            println!(
                "{:>id_w$}: {:<25} | {}{} => {}",
                entry.id,
                date,
                op_target,
                padding,
                entry.message,
                id_w = id_w
            );
        }

        Ok(())
    }
}
