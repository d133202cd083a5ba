use crate::errors::{AppError, AppResult};
use chrono::{Datelike, Months, NaiveDate};

/// Storage format for calendar dates (`time_blocks.date`).
pub const DATE_FMT: &str = "%Y-%m-%d";

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).ok()
}

/// Parse a CLI date argument; `today`/`yesterday`/`tomorrow` are accepted too.
pub fn parse_date_arg(s: &str) -> AppResult<NaiveDate> {
    match s.to_lowercase().as_str() {
        "today" => Ok(today()),
        "yesterday" => today()
            .pred_opt()
            .ok_or_else(|| AppError::InvalidDate(s.to_string())),
        "tomorrow" => today()
            .succ_opt()
            .ok_or_else(|| AppError::InvalidDate(s.to_string())),
        _ => parse_date(s).ok_or_else(|| AppError::InvalidDate(s.to_string())),
    }
}

pub fn date_to_db(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

/// Resolve a period into an inclusive `(from, to)` range.
///
/// Accepted forms: `YYYY-MM-DD`, `YYYY-MM`, `YYYY`, and `START:END` where each
/// side is one of the previous forms.
pub fn resolve_period(p: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    if let Some((start, end)) = p.split_once(':') {
        let (from, _) = single_period(start)?;
        let (_, to) = single_period(end)?;
        if from > to {
            return Err(AppError::InvalidDate(format!("empty range: {p}")));
        }
        return Ok((from, to));
    }
    single_period(p)
}

fn single_period(p: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    // YYYY-MM-DD
    if let Some(d) = parse_date(p) {
        return Ok((d, d));
    }

    // YYYY-MM
    if let Ok(first) = NaiveDate::parse_from_str(&format!("{p}-01"), DATE_FMT) {
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| AppError::InvalidDate(p.to_string()))?;
        return Ok((first, last));
    }

    // YYYY
    if p.len() == 4
        && let Ok(year) = p.parse::<i32>()
    {
        let first = NaiveDate::from_ymd_opt(year, 1, 1);
        let last = NaiveDate::from_ymd_opt(year, 12, 31);
        if let (Some(f), Some(l)) = (first, last) {
            return Ok((f, l));
        }
    }

    Err(AppError::InvalidDate(format!("Invalid period: {p}")))
}

/// `date` minus whole months, clamped to the end of shorter months.
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

pub fn years_before(date: NaiveDate, years: u32) -> NaiveDate {
    months_before(date, years * 12)
}

pub fn weeks_before(date: NaiveDate, weeks: i64) -> NaiveDate {
    date - chrono::Duration::weeks(weeks)
}

pub fn weekday_str(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Mon",
        chrono::Weekday::Tue => "Tue",
        chrono::Weekday::Wed => "Wed",
        chrono::Weekday::Thu => "Thu",
        chrono::Weekday::Fri => "Fri",
        chrono::Weekday::Sat => "Sat",
        chrono::Weekday::Sun => "Sun",
    }
}
