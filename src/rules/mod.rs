mod loader;
pub mod table;

pub use loader::{load_rule_file, RuleTableError};
pub use table::{OverrideRule, RuleTable};
