/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";

pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Completed blocks are green, started ones yellow, planned ones plain.
pub fn color_for_status(completed: bool, started: bool) -> &'static str {
    if completed {
        GREEN
    } else if started {
        YELLOW
    } else {
        RESET
    }
}

/// Truecolor background swatch for a `#RRGGBB` value.
pub fn hex_swatch(hex: &str) -> Option<String> {
    let h = hex.strip_prefix('#')?;
    if h.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(h.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(h.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(h.get(4..6)?, 16).ok()?;
    Some(format!("\x1b[48;2;{r};{g};{b}m  "))
}

/// Grey out empty values and `--:--` placeholders.
pub fn colorize_optional(value: &str) -> String {
    if value.trim().is_empty() || value.trim() == "--:--" {
        format!("{GREY}{value}{RESET}")
    } else {
        value.to_string()
    }
}
