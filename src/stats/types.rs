use serde::{Deserialize, Serialize};

/// One calendar day's bucket inside the weekly view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    /// Local-timezone day key, `YYYY-MM-DD`.
    pub key: String,
    /// Weekday label for chart axes.
    pub label: String,
    pub minutes: u64,
    pub correct: u64,
    pub total: u64,
    /// `correct / total` rounded to 2 decimals; 0 for empty days.
    pub correct_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    /// Exactly 7 buckets, oldest first, ending today.
    pub days: Vec<DaySummary>,
    pub total_minutes: u64,
    /// Integer percentage; minutes-weighted when any time was logged.
    pub avg_correct_rate: u32,
    /// Consecutive non-empty days ending today.
    pub streak_days: u32,
    pub correct_minutes: u64,
    pub wrong_minutes: u64,
}

/// Per-module slice of today's activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMinutes {
    pub module: String,
    pub sessions: u64,
    pub minutes: u64,
}
