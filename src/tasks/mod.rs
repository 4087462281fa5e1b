pub mod quarantine;
pub mod scanner;
mod sink;

pub use quarantine::{quarantine, quarantine_batch, QuarantineError};
pub use scanner::{open_folder, scan, ScanError, ScanOptions};
pub use sink::SpamSink;
