//! Badge evaluation over aggregate stats, with a sticky unlock ledger.
//!
//! Unlocks are monotonic: once a badge's timestamp lands in the ledger it
//! is never altered or removed, even when later stats no longer satisfy
//! the predicate. Clearing the record store leaves the ledger untouched;
//! the two slots are independently lived.

mod badges;

pub use badges::{BadgeDef, BADGES, MATH_MODULE};

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::StudyRecord;
use crate::stats::{self, weekly_summary};
use crate::storage::{SlotStorage, ACHIEVEMENTS_SLOT};

/// Correct answers per level step.
const POINTS_PER_LEVEL: u64 = 50;

/// Aggregate statistics a badge predicate sees. Recomputed from the full
/// history on every evaluation; nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub sessions: u64,
    pub total_answered: u64,
    pub total_correct: u64,
    /// Maximum single-session accuracy, not the aggregate ratio.
    pub best_accuracy: f64,
    pub streak_days: u32,
    /// Overall minutes, floor 0 per record (unlike today views).
    pub minutes: u64,
    pub module_counts: HashMap<String, u64>,
}

#[derive(Debug, Clone, Copy)]
pub struct BadgeProgress {
    pub unlocked: bool,
    /// 0..1 toward the badge's goal, clamped.
    pub progress: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeStatus {
    pub id: String,
    pub title: String,
    pub goal: Option<u32>,
    pub unlocked: bool,
    pub progress: f64,
    /// Moment the unlock was first observed, ms since epoch.
    pub unlocked_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementReport {
    pub badges: Vec<BadgeStatus>,
    /// Accumulated correct answers.
    pub points: u64,
    pub level: u32,
}

pub fn compute_stats(records: &[StudyRecord], now_ms: i64) -> Stats {
    let mut module_counts: HashMap<String, u64> = HashMap::new();
    let mut total_answered = 0u64;
    let mut total_correct = 0u64;
    let mut minutes = 0u64;
    let mut best_accuracy = 0.0f64;

    for record in records {
        total_answered += u64::from(record.total);
        total_correct += u64::from(record.score);
        minutes += stats::rounded_minutes(record.elapsed_ms);
        best_accuracy = best_accuracy.max(record.accuracy());
        *module_counts.entry(record.module.clone()).or_insert(0) += 1;
    }

    Stats {
        sessions: records.len() as u64,
        total_answered,
        total_correct,
        best_accuracy,
        streak_days: weekly_summary(records, now_ms).streak_days,
        minutes,
        module_counts,
    }
}

pub(crate) fn level_for(points: u64) -> u32 {
    (points / POINTS_PER_LEVEL + 1) as u32
}

/// Owns the achievements slot: badge-id -> first-unlock timestamp.
#[derive(Clone)]
pub struct AchievementLedger {
    storage: Arc<dyn SlotStorage>,
}

impl AchievementLedger {
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        Self { storage }
    }

    /// Evaluates every badge against the given history and persists any
    /// newly observed unlocks.
    pub fn evaluate(&self, records: &[StudyRecord], now_ms: i64) -> AchievementReport {
        let stats = compute_stats(records, now_ms);
        self.evaluate_stats(&stats, now_ms)
    }

    /// Evaluation against precomputed stats. The ledger is rewritten on
    /// every call, changed or not.
    pub fn evaluate_stats(&self, stats: &Stats, now_ms: i64) -> AchievementReport {
        let mut unlocks = self.read_unlocks();
        let mut badges = Vec::with_capacity(BADGES.len());

        for def in BADGES {
            let outcome = (def.eval)(stats);
            if outcome.unlocked {
                unlocks.entry(def.id.to_string()).or_insert(now_ms);
            }

            // Sticky: a ledger entry wins over the current predicate.
            let unlocked_at = unlocks.get(def.id).copied();
            badges.push(BadgeStatus {
                id: def.id.to_string(),
                title: def.title.to_string(),
                goal: def.goal,
                unlocked: unlocked_at.is_some(),
                progress: outcome.progress,
                unlocked_at,
            });
        }

        self.write_unlocks(&unlocks);

        let points = stats.total_correct;
        AchievementReport {
            badges,
            points,
            level: level_for(points),
        }
    }

    fn read_unlocks(&self) -> HashMap<String, i64> {
        let Some(raw) = self.storage.get(ACHIEVEMENTS_SLOT) else {
            return HashMap::new();
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(err) => {
                warn!("Achievements slot is not a valid unlock map, treating as empty: {err}");
                HashMap::new()
            }
        }
    }

    fn write_unlocks(&self, unlocks: &HashMap<String, i64>) {
        match serde_json::to_string(unlocks) {
            Ok(raw) => {
                if let Err(err) = self.storage.set(ACHIEVEMENTS_SLOT, &raw) {
                    warn!("Failed to persist unlock map: {err}");
                }
            }
            Err(err) => warn!("Failed to serialize unlock map: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::{Days, Local, TimeZone};

    fn local_ts(back: u64, hour: u32) -> i64 {
        let date = Local::now().date_naive() - Days::new(back);
        let naive = date.and_hms_opt(hour, 0, 0).unwrap();
        Local
            .from_local_datetime(&naive)
            .single()
            .unwrap()
            .timestamp_millis()
    }

    fn ledger() -> (Arc<MemoryStorage>, AchievementLedger) {
        let storage = Arc::new(MemoryStorage::new());
        let ledger = AchievementLedger::new(storage.clone());
        (storage, ledger)
    }

    fn badge<'a>(report: &'a AchievementReport, id: &str) -> &'a BadgeStatus {
        report
            .badges
            .iter()
            .find(|b| b.id == id)
            .unwrap_or_else(|| panic!("badge {id} missing from report"))
    }

    #[test]
    fn three_math_sessions_on_three_days() {
        let records: Vec<StudyRecord> = (0..3)
            .map(|back| StudyRecord::new(MATH_MODULE, 8, 10, 600_000, local_ts(back, 12)))
            .collect();
        let now = Local::now().timestamp_millis();

        let stats = compute_stats(&records, now);
        assert_eq!(stats.sessions, 3);
        assert_eq!(stats.total_answered, 30);
        assert_eq!(stats.total_correct, 24);
        assert!((stats.best_accuracy - 0.8).abs() < 1e-9);
        assert_eq!(stats.streak_days, 3);
        assert_eq!(stats.minutes, 30);
        assert_eq!(stats.module_counts.get(MATH_MODULE), Some(&3));

        let (_storage, ledger) = ledger();
        let report = ledger.evaluate(&records, now);

        assert!(badge(&report, "math-3").unlocked);
        assert!(badge(&report, "first-session").unlocked);
        assert!(badge(&report, "streak-3").unlocked);

        let ten = badge(&report, "ten-sessions");
        assert!(!ten.unlocked);
        assert!((ten.progress - 0.3).abs() < 1e-9);

        let sharp = badge(&report, "accuracy-90");
        assert!(!sharp.unlocked);
        assert!((sharp.progress - 0.8 / 0.9).abs() < 1e-9);

        assert_eq!(report.points, 24);
        assert_eq!(report.level, 1);
    }

    #[test]
    fn unlocks_are_sticky_with_original_timestamp() {
        let (_storage, ledger) = ledger();

        let satisfied = Stats {
            sessions: 1,
            ..Stats::default()
        };
        let first = ledger.evaluate_stats(&satisfied, 1_000);
        assert!(badge(&first, "first-session").unlocked);
        assert_eq!(badge(&first, "first-session").unlocked_at, Some(1_000));

        // Stats that no longer satisfy the predicate (e.g. after a clear).
        let second = ledger.evaluate_stats(&Stats::default(), 2_000);
        let status = badge(&second, "first-session");
        assert!(status.unlocked);
        assert_eq!(status.unlocked_at, Some(1_000));
        assert_eq!(status.progress, 0.0);
    }

    #[test]
    fn ledger_is_persisted_even_when_empty() {
        let (storage, ledger) = ledger();
        ledger.evaluate_stats(&Stats::default(), 0);
        assert_eq!(storage.get(ACHIEVEMENTS_SLOT).as_deref(), Some("{}"));
    }

    #[test]
    fn corrupt_ledger_degrades_to_empty() {
        let (storage, ledger) = ledger();
        storage.set(ACHIEVEMENTS_SLOT, "[1, 2, 3]").unwrap();

        let report = ledger.evaluate_stats(&Stats::default(), 0);
        assert!(report.badges.iter().all(|b| !b.unlocked));
    }

    #[test]
    fn clearing_records_keeps_achievements() {
        let storage = Arc::new(MemoryStorage::new());
        let records = crate::records::RecordStore::new(storage.clone());
        let ledger = AchievementLedger::new(storage);

        let now = Local::now().timestamp_millis();
        records
            .append(&StudyRecord::new(MATH_MODULE, 10, 10, 300_000, now - 1_000))
            .unwrap();
        let before = ledger.evaluate(&records.read_all(), now);
        assert!(badge(&before, "first-session").unlocked);
        assert!(badge(&before, "accuracy-90").unlocked);

        records.clear();
        let after = ledger.evaluate(&records.read_all(), now);
        assert!(badge(&after, "first-session").unlocked);
        assert!(badge(&after, "accuracy-90").unlocked);
        assert_eq!(after.points, 0);
    }

    #[test]
    fn level_steps_every_fifty_points() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(49), 1);
        assert_eq!(level_for(50), 2);
        assert_eq!(level_for(125), 3);
    }
}
