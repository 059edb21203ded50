use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// A sentinel already existed; `completed_at` is its modification time.
    Skipped { completed_at: DateTime<Utc> },
    Imported { database: String },
}

impl ImportOutcome {
    pub fn was_skipped(&self) -> bool {
        matches!(self, ImportOutcome::Skipped { .. })
    }
}
