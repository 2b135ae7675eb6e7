mod record;

pub use record::StudyRecord;
