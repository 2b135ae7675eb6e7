use std::collections::HashSet;
use std::sync::Arc;

use chrono::{SecondsFormat, TimeZone, Utc};
use log::warn;

use crate::models::StudyRecord;
use crate::storage::{SlotStorage, WriteError, RECORDS_SLOT};

pub(crate) const DAY_MS: i64 = 86_400_000;

/// Append-only log of study sessions in a single storage slot.
///
/// Every append rewrites the whole slot (read, push, serialize, write), so
/// writes cost O(n) in history size. Reads never fail: a missing, corrupt,
/// or wrong-shape slot degrades to an empty history.
#[derive(Clone)]
pub struct RecordStore {
    storage: Arc<dyn SlotStorage>,
}

impl RecordStore {
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        Self { storage }
    }

    /// All records in the order they were appended (not time-sorted).
    ///
    /// Elements that do not deserialize to a [`StudyRecord`] with a numeric
    /// timestamp are dropped individually; a slot that is not a JSON array
    /// at all yields an empty history.
    pub fn read_all(&self) -> Vec<StudyRecord> {
        let Some(raw) = self.storage.get(RECORDS_SLOT) else {
            return Vec::new();
        };

        let parsed: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!("Records slot is not valid JSON, treating as empty: {err}");
                return Vec::new();
            }
        };

        let Some(items) = parsed.as_array() else {
            warn!("Records slot is not a JSON array, treating as empty");
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| {
                if !item.get("timestamp").is_some_and(|t| t.is_number()) {
                    return None;
                }
                serde_json::from_value::<StudyRecord>(item.clone()).ok()
            })
            .collect()
    }

    /// Appends one record and rewrites the slot.
    ///
    /// The error is reported so tests (and future callers) can observe
    /// write failures, but the shell treats it as non-fatal: a dropped
    /// write loses one session of non-critical local history.
    pub fn append(&self, record: &StudyRecord) -> Result<(), WriteError> {
        let mut records = self.read_all();
        records.push(record.clone());
        let serialized = serde_json::to_string(&records)?;
        self.storage.set(RECORDS_SLOT, &serialized)
    }

    /// Removes the entire history. Idempotent.
    pub fn clear(&self) {
        self.storage.remove(RECORDS_SLOT);
    }

    /// Most recent records first, at most `limit` of them.
    pub fn read_recent(&self, limit: usize) -> Vec<StudyRecord> {
        let mut records = self.read_all();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        records
    }

    /// Records from the last `days` * 24h up to now, inclusive.
    ///
    /// The window is anchored at the current instant, not at midnight, so a
    /// `days = 1` window reaches into yesterday evening. Callers wanting a
    /// true calendar day must re-filter by day key (see `stats`).
    pub fn read_within_days(&self, days: u32) -> Vec<StudyRecord> {
        within_window(self.read_all(), days, Utc::now().timestamp_millis())
    }

    /// Unique module names across the whole history.
    pub fn distinct_modules(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut modules = Vec::new();
        for record in self.read_all() {
            if seen.insert(record.module.clone()) {
                modules.push(record.module);
            }
        }
        modules
    }

    /// Serializes the whole history to CSV, one row per record in store
    /// order, with RFC 4180 quoting.
    pub fn export_csv(&self) -> String {
        let mut out = String::from("module,score,total,elapsedMs,timestamp,iso");
        for record in self.read_all() {
            out.push('\n');
            out.push_str(&csv_escape(&record.module));
            out.push_str(&format!(
                ",{},{},{},{},{}",
                record.score,
                record.total,
                record.elapsed_ms,
                record.timestamp,
                iso_timestamp(record.timestamp)
            ));
        }
        out
    }
}

fn within_window(records: Vec<StudyRecord>, days: u32, now_ms: i64) -> Vec<StudyRecord> {
    let cutoff = now_ms - i64::from(days) * DAY_MS;
    records
        .into_iter()
        .filter(|r| r.timestamp >= cutoff && r.timestamp <= now_ms)
        .collect()
}

/// UTC ISO-8601 with millisecond precision, the shape `Date.toISOString`
/// produced in the exported files users already have.
fn iso_timestamp(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => String::new(),
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> (Arc<MemoryStorage>, RecordStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = RecordStore::new(storage.clone());
        (storage, store)
    }

    fn record(module: &str, score: u32, total: u32, elapsed_ms: u64, timestamp: i64) -> StudyRecord {
        StudyRecord::new(module, score, total, elapsed_ms, timestamp)
    }

    #[test]
    fn append_then_read_round_trips() {
        let (_storage, store) = store();
        assert!(store.read_all().is_empty());

        let first = record("加减法练习", 8, 10, 600_000, 1_700_000_000_000);
        store.append(&first).unwrap();

        let second = record("图形配对", 5, 5, 120_000, 1_700_000_100_000);
        store.append(&second).unwrap();

        let all = store.read_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], first);
        assert_eq!(all[1], second);
    }

    #[test]
    fn persisted_field_names_match_layout() {
        let (storage, store) = store();
        store
            .append(&record("判断题", 3, 4, 90_000, 1_700_000_000_000))
            .unwrap();

        let raw = storage.get(RECORDS_SLOT).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &value.as_array().unwrap()[0];
        assert_eq!(first["module"], "判断题");
        assert_eq!(first["score"], 3);
        assert_eq!(first["total"], 4);
        assert_eq!(first["elapsedMs"], 90_000);
        assert_eq!(first["timestamp"], 1_700_000_000_000_i64);
    }

    #[test]
    fn clear_is_idempotent() {
        let (_storage, store) = store();
        store
            .append(&record("排序", 1, 3, 60_000, 1_700_000_000_000))
            .unwrap();

        store.clear();
        store.clear();
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn corrupt_slot_degrades_to_empty() {
        let (storage, store) = store();

        storage.set(RECORDS_SLOT, "definitely not json").unwrap();
        assert!(store.read_all().is_empty());

        storage.set(RECORDS_SLOT, "{\"a\": 1}").unwrap();
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn invalid_elements_are_dropped_individually() {
        let (storage, store) = store();
        let blob = r#"[
            {"module":"排序","score":1,"total":3,"elapsedMs":60000,"timestamp":1700000000000},
            {"module":"no-timestamp","score":1,"total":3,"elapsedMs":60000},
            {"module":"string-timestamp","score":1,"total":3,"elapsedMs":60000,"timestamp":"soon"},
            42
        ]"#;
        storage.set(RECORDS_SLOT, blob).unwrap();

        let all = store.read_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].module, "排序");
    }

    #[test]
    fn append_surfaces_write_failure() {
        let (storage, store) = store();
        storage.set_read_only(true);

        let result = store.append(&record("排序", 1, 3, 60_000, 1_700_000_000_000));
        assert!(matches!(result, Err(WriteError::Backend(_))));
        // The failed write left nothing behind.
        storage.set_read_only(false);
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn read_recent_sorts_by_timestamp_descending() {
        let (_storage, store) = store();
        for ts in [3, 1, 2] {
            store.append(&record("排序", 1, 3, 60_000, ts)).unwrap();
        }

        let recent = store.read_recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, 3);
        assert_eq!(recent[1].timestamp, 2);
    }

    #[test]
    fn within_window_is_anchored_at_now() {
        let now = 1_700_000_000_000_i64;
        let records = vec![
            record("a", 1, 1, 0, now - DAY_MS - 1),
            record("b", 1, 1, 0, now - DAY_MS),
            record("c", 1, 1, 0, now - 1_000),
            record("d", 1, 1, 0, now + 1),
        ];

        let kept = within_window(records, 1, now);
        let modules: Vec<_> = kept.iter().map(|r| r.module.as_str()).collect();
        assert_eq!(modules, ["b", "c"]);
    }

    #[test]
    fn distinct_modules_are_unique() {
        let (_storage, store) = store();
        for module in ["加减法练习", "排序", "加减法练习"] {
            store.append(&record(module, 1, 3, 60_000, 1)).unwrap();
        }

        let modules = store.distinct_modules();
        assert_eq!(modules, ["加减法练习", "排序"]);
    }

    #[test]
    fn csv_escapes_commas_and_quotes() {
        let (_storage, store) = store();
        store
            .append(&record("A,\"B\"", 8, 10, 600_000, 0))
            .unwrap();

        let csv = store.export_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("module,score,total,elapsedMs,timestamp,iso"));
        assert_eq!(
            lines.next(),
            Some("\"A,\"\"B\"\"\",8,10,600000,0,1970-01-01T00:00:00.000Z")
        );
    }
}
