//! User-facing status lines. Errors go to stderr, everything else to stdout.

use crate::utils::colors::{CYAN, GREEN, RED, RESET, YELLOW};
use std::fmt;

const BOLD: &str = "\x1b[1m";

#[derive(Clone, Copy)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn style(self) -> (&'static str, &'static str) {
        match self {
            Level::Info => (CYAN, "ℹ️"),
            Level::Success => (GREEN, "✅"),
            Level::Warning => (YELLOW, "⚠️"),
            Level::Error => (RED, "❌"),
        }
    }
}

/// `NO_COLOR` (any value) disables escape sequences.
fn colored() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn line<T: fmt::Display>(level: Level, msg: T) -> String {
    let (color, icon) = level.style();
    if colored() {
        format!("{color}{BOLD}{icon} {RESET}{msg}")
    } else {
        format!("{icon} {msg}")
    }
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{}", line(Level::Info, msg));
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{}", line(Level::Success, msg));
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{}", line(Level::Warning, msg));
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{}", line(Level::Error, msg));
}

/// Section title followed by a blank line.
pub fn header<T: fmt::Display>(msg: T) {
    let title = msg.to_string();
    let rule = "─".repeat(title.chars().count().max(12));
    if colored() {
        println!("{CYAN}{BOLD}{title}\n{rule}{RESET}\n");
    } else {
        println!("{title}\n{rule}\n");
    }
}
