//! Time utilities: parsing HH:MM, epoch milliseconds, formatting minutes, etc.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Local, NaiveTime, Timelike, Utc};

/// Storage format for clock times (`time_blocks.*_time` columns).
pub const TIME_FMT: &str = "%H:%M";

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t, TIME_FMT)
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M:%S"))
        .ok()
}

pub fn parse_time_arg(t: &str) -> AppResult<NaiveTime> {
    parse_time(t).ok_or_else(|| AppError::InvalidTime(t.to_string()))
}

pub fn parse_optional_time(input: Option<&String>) -> AppResult<Option<NaiveTime>> {
    input.map(|s| parse_time_arg(s)).transpose()
}

pub fn time_to_db(t: NaiveTime) -> String {
    t.format(TIME_FMT).to_string()
}

/// Drop seconds and sub-seconds: stored times have minute precision.
pub fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    let duration = end - start;
    duration.num_minutes()
}

pub fn format_minutes(mins: i64) -> String {
    let sign = if mins < 0 { "-" } else { "" };
    let m = mins.abs();
    format!("{}{:02}:{:02}", sign, m / 60, m % 60)
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Epoch milliseconds as local `YYYY-MM-DD HH:MM`.
pub fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}
