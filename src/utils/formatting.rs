//! Formatting utilities used for CLI outputs.

use crate::utils::colors::{RESET, hex_swatch};
use regex::Regex;
use std::sync::OnceLock;

/// Remove ANSI colour sequences, leaving the visible text.
pub fn strip_ansi(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1B\[[0-9;]*[mK]").expect("valid ANSI pattern"));
    re.replace_all(s, "").into_owned()
}

pub fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

pub fn mins2readable(mins: i64, want_sign: bool, short: bool) -> String {
    let abs_m = mins.abs();
    let hours = abs_m / 60;
    let minutes = abs_m % 60;

    let sign = if mins > 0 && want_sign {
        "+"
    } else if mins < 0 && want_sign {
        "-"
    } else {
        ""
    };

    if short {
        // +02:25
        format!("{}{:02}:{:02}", sign, hours, minutes)
    } else {
        format!("{}{:02}h {:02}m", sign, hours, minutes)
    }
}

/// Hours with one decimal, e.g. `12.5h`.
pub fn hours_readable(hours: f64) -> String {
    format!("{hours:.1}h")
}

/// Render a category label preceded by a coloured swatch.
pub fn category_label(icon: &str, name: &str, color: &str) -> String {
    match hex_swatch(color) {
        Some(sw) => format!("{sw}{RESET} {icon} {name}"),
        None => format!("{icon} {name}"),
    }
}

/// Progress bar made of `width` cells.
pub fn progress_bar(percent: i32, width: usize) -> String {
    let pct = usize::try_from(percent.clamp(0, 100)).unwrap_or(0);
    let filled = pct * width / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// Wrap free text to `width` columns, every line prefixed with `indent`.
pub fn wrap_indented(text: &str, width: usize, indent: &str) -> String {
    let opts = textwrap::Options::new(width)
        .initial_indent(indent)
        .subsequent_indent(indent);
    textwrap::fill(text, opts)
}
