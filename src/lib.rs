//! studykit — the local statistics core of a kids' quiz app.
//!
//! Mini-game activities append one [`models::StudyRecord`] per finished
//! session into the [`records::RecordStore`]; the [`stats`] module derives
//! weekly and per-day views from the full history on demand, and
//! [`achievements`] evaluates a fixed badge rule set with a sticky unlock
//! ledger. All persistent state lives in two slots of an injected
//! [`storage::SlotStorage`].

pub mod achievements;
pub mod models;
pub mod records;
pub mod stats;
pub mod storage;

pub use achievements::{AchievementLedger, AchievementReport};
pub use models::StudyRecord;
pub use records::RecordStore;
