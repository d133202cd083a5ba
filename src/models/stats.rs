use serde::Serialize;

/// Per-category aggregate over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category_id: String,
    pub count: i64,
    pub total_minutes: f64,
}

/// Aggregates for an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsData {
    pub total_hours: f64,
    pub completed_blocks: i64,
    pub category_stats: Vec<CategoryStat>,
}

/// Live summary of the current day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodayStats {
    pub total_blocks: i64,
    pub completed_blocks: i64,
    pub total_minutes: i64,
    pub completion_rate: i64,
}
