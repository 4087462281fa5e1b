pub mod message;
pub mod types;

pub use message::{NormalizedMessage, SpamHit};
pub use types::{CreateOutcome, Label, QuarantineOutcome, ScanReport, Verdict};
