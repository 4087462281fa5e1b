use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub i64);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Spam,
    NotSpam,
}

impl Verdict {
    pub fn is_spam(self) -> bool {
        matches!(self, Verdict::Spam)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuarantineOutcome {
    Moved,
    CopiedAndPurged,
}

impl fmt::Display for QuarantineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuarantineOutcome::Moved => f.write_str("moved"),
            QuarantineOutcome::CopiedAndPurged => f.write_str("copied and purged"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub inspected: usize,
    pub spam: usize,
    pub skipped: usize,
    /// `None` when the folder could not be created; the scan still ran.
    pub quarantine_folder: Option<CreateOutcome>,
}
