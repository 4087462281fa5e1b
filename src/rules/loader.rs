use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use super::table::{OverrideRule, RuleTable};

const KEYWORDS_COLUMN: &str = "Keywords";
const SENDER_COLUMN: &str = "Sender";
const SUBJECT_COLUMN: &str = "Subject";

#[derive(Debug, Error)]
pub enum RuleTableError {
    #[error("failed to read rule table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Loads override rules from a `Keywords,Sender,Subject` CSV file.
///
/// A missing file yields an empty table. Empty cells are treated as absent.
pub fn load_rule_file(path: &Path) -> Result<RuleTable, RuleTableError> {
    if !path.exists() {
        tracing::info!(
            target: "rules",
            path = %path.display(),
            "rule table not found; continuing with no overrides"
        );
        return Ok(RuleTable::empty());
    }

    let read_err = |source| RuleTableError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .trim(Trim::Headers)
        .flexible(true)
        .from_path(path)
        .map_err(read_err)?;

    let headers = reader.headers().map_err(read_err)?.clone();
    let columns = Columns::locate(&headers);

    let mut rows = Vec::new();
    let mut inert = 0;
    for record in reader.records() {
        let rule = columns.rule_from(&record.map_err(read_err)?);
        if rule.is_inert() {
            inert += 1;
            continue;
        }
        rows.push(rule);
    }

    let raw_count = rows.len();
    let table = RuleTable::load(rows);
    if inert > 0 {
        tracing::warn!(target: "rules", path = %path.display(), inert, "ignoring rows with no populated cells");
    }
    tracing::info!(
        target: "rules",
        path = %path.display(),
        rows = raw_count,
        unique = table.len(),
        "rule table loaded"
    );
    Ok(table)
}

struct Columns {
    keyword: Option<usize>,
    sender: Option<usize>,
    subject: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let columns = Self {
            keyword: find(KEYWORDS_COLUMN),
            sender: find(SENDER_COLUMN),
            subject: find(SUBJECT_COLUMN),
        };
        if columns.keyword.is_none() && columns.sender.is_none() && columns.subject.is_none() {
            tracing::warn!(
                target: "rules",
                headers = ?headers,
                "rule table has none of the Keywords/Sender/Subject columns; every row is inert"
            );
        }
        columns
    }

    fn rule_from(&self, record: &StringRecord) -> OverrideRule {
        OverrideRule {
            keyword: cell(record, self.keyword),
            sender_substr: cell(record, self.sender),
            subject_substr: cell(record, self.subject),
        }
    }
}

fn cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|idx| record.get(idx))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
