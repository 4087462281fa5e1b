use std::collections::HashSet;

use crate::domain::NormalizedMessage;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OverrideRule {
    pub keyword: Option<String>,
    pub sender_substr: Option<String>,
    pub subject_substr: Option<String>,
}

impl OverrideRule {
    pub fn keyword(value: impl Into<String>) -> Self {
        Self {
            keyword: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn sender(value: impl Into<String>) -> Self {
        Self {
            sender_substr: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn subject(value: impl Into<String>) -> Self {
        Self {
            subject_substr: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn is_inert(&self) -> bool {
        self.keyword.is_none() && self.sender_substr.is_none() && self.subject_substr.is_none()
    }

    fn matches(&self, fields: &LoweredFields) -> bool {
        if let Some(keyword) = &self.keyword {
            let needle = keyword.to_lowercase();
            if fields.sender.contains(&needle)
                || fields.subject.contains(&needle)
                || fields.body.contains(&needle)
            {
                return true;
            }
        }
        if let Some(sender) = &self.sender_substr {
            if fields.sender.contains(&sender.to_lowercase()) {
                return true;
            }
        }
        if let Some(subject) = &self.subject_substr {
            if fields.subject.contains(&subject.to_lowercase()) {
                return true;
            }
        }
        false
    }
}

struct LoweredFields {
    sender: String,
    subject: String,
    body: String,
}

impl LoweredFields {
    fn of(message: &NormalizedMessage) -> Self {
        Self {
            sender: message.sender.to_lowercase(),
            subject: message.subject.to_lowercase(),
            body: message.body.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<OverrideRule>,
}

impl RuleTable {
    /// Builds a table, dropping exact duplicate rows and keeping the first occurrence.
    pub fn load(rows: impl IntoIterator<Item = OverrideRule>) -> Self {
        let mut seen = HashSet::new();
        let rules = rows
            .into_iter()
            .filter(|rule| seen.insert(rule.clone()))
            .collect();
        Self { rules }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[OverrideRule] {
        &self.rules
    }

    /// True when any rule matches. Matching is case-insensitive substring, not whole-token.
    pub fn exempt(&self, message: &NormalizedMessage) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let fields = LoweredFields::of(message);
        self.rules.iter().any(|rule| rule.matches(&fields))
    }
}
