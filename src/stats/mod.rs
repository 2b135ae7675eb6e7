//! Day- and week-level summaries derived from the record history.
//!
//! Everything here is a pure function of a record slice and an injected
//! `now_ms`; nothing is cached, every call re-scans the history. The shell
//! re-invokes these after any append or clear.

mod types;

pub use types::{DaySummary, ModuleMinutes, WeeklySummary};

use chrono::{Datelike, Days, Local, NaiveDate, TimeZone};

use crate::models::StudyRecord;

const WEEKDAY_LABELS: [&str; 7] = ["周日", "周一", "周二", "周三", "周四", "周五", "周六"];

/// Local calendar-day key for a millisecond timestamp, `YYYY-MM-DD`.
///
/// Two timestamps share a key iff they fall on the same local date. An
/// out-of-range timestamp yields an empty key, which matches no bucket.
pub fn day_key(timestamp_ms: i64) -> String {
    match local_date(timestamp_ms) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

/// The 7 day keys from 6 days ago through today, oldest first, each with
/// its weekday label.
pub fn last_7_day_labels(now_ms: i64) -> Vec<(String, String)> {
    let today = local_date(now_ms).unwrap_or_else(|| Local::now().date_naive());
    (0..7u64)
        .rev()
        .map(|back| {
            let date = today - Days::new(back);
            let label = WEEKDAY_LABELS[date.weekday().num_days_from_sunday() as usize];
            (date.format("%Y-%m-%d").to_string(), label.to_string())
        })
        .collect()
}

/// Buckets the history into the trailing 7 local calendar days.
pub fn weekly_summary(records: &[StudyRecord], now_ms: i64) -> WeeklySummary {
    let mut days: Vec<DaySummary> = last_7_day_labels(now_ms)
        .into_iter()
        .map(|(key, label)| DaySummary {
            key,
            label,
            minutes: 0,
            correct: 0,
            total: 0,
            correct_rate: 0.0,
        })
        .collect();

    for record in records {
        let key = day_key(record.timestamp);
        if let Some(day) = days.iter_mut().find(|d| d.key == key) {
            // Weekly buckets floor at 0: a sub-30-second session adds no time.
            day.minutes += rounded_minutes(record.elapsed_ms);
            day.correct += u64::from(record.score);
            day.total += u64::from(record.total);
        }
    }

    for day in &mut days {
        day.correct_rate = if day.total > 0 {
            ((day.correct as f64 / day.total as f64) * 100.0).round() / 100.0
        } else {
            0.0
        };
    }

    let total_minutes: u64 = days.iter().map(|d| d.minutes).sum();
    let avg_correct_rate = average_correct_rate(&days, total_minutes);

    let minutes: Vec<u64> = days.iter().map(|d| d.minutes).collect();
    let streak_days = trailing_streak(&minutes);

    let correct_minutes: u64 = days
        .iter()
        .map(|d| (d.minutes as f64 * d.correct_rate).round() as u64)
        .sum();
    let wrong_minutes = total_minutes.saturating_sub(correct_minutes);

    WeeklySummary {
        days,
        total_minutes,
        avg_correct_rate,
        streak_days,
        correct_minutes,
        wrong_minutes,
    }
}

/// Minutes studied today, floor 1 per session.
///
/// Today views deliberately count every session as at least a minute so a
/// short game still shows up; the weekly buckets do not. Preserved per
/// call site.
pub fn minutes_today(records: &[StudyRecord], now_ms: i64) -> u64 {
    let today = day_key(now_ms);
    records
        .iter()
        .filter(|r| day_key(r.timestamp) == today)
        .map(|r| rounded_minutes(r.elapsed_ms).max(1))
        .sum()
}

/// Today's sessions and minutes per module, in first-seen order.
pub fn today_breakdown(records: &[StudyRecord], now_ms: i64) -> Vec<ModuleMinutes> {
    let today = day_key(now_ms);
    let mut breakdown: Vec<ModuleMinutes> = Vec::new();
    for record in records.iter().filter(|r| day_key(r.timestamp) == today) {
        let minutes = rounded_minutes(record.elapsed_ms).max(1);
        match breakdown.iter_mut().find(|m| m.module == record.module) {
            Some(entry) => {
                entry.sessions += 1;
                entry.minutes += minutes;
            }
            None => breakdown.push(ModuleMinutes {
                module: record.module.clone(),
                sessions: 1,
                minutes,
            }),
        }
    }
    breakdown
}

/// Consecutive non-zero entries counted from the end of the slice.
pub(crate) fn trailing_streak(minutes: &[u64]) -> u32 {
    minutes.iter().rev().take_while(|&&m| m > 0).count() as u32
}

pub(crate) fn rounded_minutes(elapsed_ms: u64) -> u64 {
    (elapsed_ms as f64 / 60_000.0).round() as u64
}

fn average_correct_rate(days: &[DaySummary], total_minutes: u64) -> u32 {
    if total_minutes > 0 {
        // Weight by study time so a long accurate day outweighs a short
        // sloppy one.
        let weighted: f64 = days.iter().map(|d| d.minutes as f64 * d.correct_rate).sum();
        (weighted / total_minutes as f64 * 100.0).round() as u32
    } else if days.is_empty() {
        0
    } else {
        let mean: f64 = days.iter().map(|d| d.correct_rate).sum::<f64>() / days.len() as f64;
        (mean * 100.0).round() as u32
    }
}

fn local_date(timestamp_ms: i64) -> Option<NaiveDate> {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.date_naive())
}
