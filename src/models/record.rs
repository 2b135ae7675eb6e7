use serde::{Deserialize, Serialize};

/// One completed play session, exactly as persisted in the records slot.
///
/// `module` is a free-form display name; new activities can appear without a
/// schema change. Records are immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyRecord {
    pub module: String,
    pub score: u32,
    pub total: u32,
    pub elapsed_ms: u64,
    /// Milliseconds since epoch, taken when the session was recorded.
    pub timestamp: i64,
}

impl StudyRecord {
    pub fn new(module: impl Into<String>, score: u32, total: u32, elapsed_ms: u64, timestamp: i64) -> Self {
        Self {
            module: module.into(),
            score,
            total,
            elapsed_ms,
            timestamp,
        }
    }

    /// Per-session accuracy ratio; 0 when the session had no questions.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.score) / f64::from(self.total)
        }
    }
}
