use crate::utils::time::{minutes_between, now_millis, truncate_to_minute};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub id: String,                            // ⇔ time_blocks.id (UUID)
    pub title: String,                         // ⇔ time_blocks.title
    pub description: Option<String>,           // ⇔ time_blocks.description
    pub start_time: NaiveTime,                 // ⇔ time_blocks.start_time ("HH:MM")
    pub end_time: NaiveTime,                   // ⇔ time_blocks.end_time ("HH:MM")
    pub category_id: String,                   // ⇔ time_blocks.category_id
    pub date: NaiveDate,                       // ⇔ time_blocks.date ("YYYY-MM-DD")
    pub is_completed: bool,                    // ⇔ time_blocks.is_completed
    pub actual_start_time: Option<NaiveTime>,  // ⇔ time_blocks.actual_start_time
    pub actual_end_time: Option<NaiveTime>,    // ⇔ time_blocks.actual_end_time
    pub created_at: i64,                       // epoch ms
    pub updated_at: i64,                       // epoch ms
}

impl TimeBlock {
    /// Build a planned (not yet started) block with a fresh UUID.
    pub fn new(
        title: &str,
        description: Option<&str>,
        start_time: NaiveTime,
        end_time: NaiveTime,
        category_id: &str,
        date: NaiveDate,
    ) -> Self {
        let now = now_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            start_time: truncate_to_minute(start_time),
            end_time: truncate_to_minute(end_time),
            category_id: category_id.to_string(),
            date,
            is_completed: false,
            actual_start_time: None,
            actual_end_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Planned duration in minutes.
    pub fn duration(&self) -> i64 {
        minutes_between(self.start_time, self.end_time)
    }

    /// Actual duration in minutes, only when both actual timestamps exist.
    pub fn actual_duration(&self) -> Option<i64> {
        match (self.actual_start_time, self.actual_end_time) {
            (Some(s), Some(e)) => Some(minutes_between(s, e)),
            _ => None,
        }
    }

    pub fn is_active_at(&self, time: NaiveTime) -> bool {
        time >= self.start_time && time <= self.end_time
    }

    pub fn is_started(&self) -> bool {
        self.actual_start_time.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.is_completed && self.actual_end_time.is_some()
    }

    /// Actual over planned duration, 0..=100.
    pub fn completion_percent(&self) -> i32 {
        if !self.is_completed {
            return 0;
        }
        let Some(actual) = self.actual_duration() else {
            return 0;
        };
        let planned = self.duration();
        if planned <= 0 {
            return 0;
        }
        let pct = (actual * 100 / planned).clamp(0, 100);
        i32::try_from(pct).unwrap_or(0)
    }
}
