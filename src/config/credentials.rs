use std::{fmt, fs, path::Path};

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct CredentialOverride {
    pub user: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for CredentialOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialOverride")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StoredEntry {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    pass: Option<String>,
}

impl StoredEntry {
    fn credentials(&self) -> Option<Credentials> {
        let user = self.user.as_deref().filter(|v| !v.is_empty())?;
        let pass = self.pass.as_deref().filter(|v| !v.is_empty())?;
        Some(Credentials::new(user, pass))
    }
}

/// Named accounts stored as `{"name": {"user": "...", "pass": "..."}}`, in file order.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: Vec<(String, StoredEntry)>,
}

impl CredentialStore {
    pub fn load(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) => {
                tracing::info!(
                    target: "config",
                    path = %path.display(),
                    error = %err,
                    "no stored credentials"
                );
                return Self::default();
            }
        };
        match Self::from_json(&json) {
            Ok(store) => {
                tracing::info!(target: "config", accounts = store.len(), "stored credentials loaded");
                store
            }
            Err(err) => {
                tracing::warn!(
                    target: "config",
                    path = %path.display(),
                    error = %err,
                    "failed to decode stored credentials"
                );
                Self::default()
            }
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: Map<String, Value> = serde_json::from_str(json)?;
        let mut entries = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            let entry: StoredEntry = serde_json::from_value(value)?;
            entries.push((name, entry));
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolution order: full override, stored entry matching the override user,
    /// first stored entry, none.
    pub fn resolve(&self, explicit: &CredentialOverride) -> Option<Credentials> {
        let user = explicit.user.as_deref().filter(|v| !v.is_empty());
        let password = explicit.password.as_deref().filter(|v| !v.is_empty());

        if let (Some(user), Some(password)) = (user, password) {
            tracing::info!(target: "config", "using explicitly supplied credentials");
            return Some(Credentials::new(user, password));
        }

        if let Some(user) = user {
            let matched = self
                .entries
                .iter()
                .find(|(_, entry)| entry.user.as_deref() == Some(user));
            if let Some((name, entry)) = matched {
                if let Some(credentials) = entry.credentials() {
                    tracing::info!(target: "config", account = %name, "matching stored account found");
                    return Some(credentials);
                }
            }
        }

        let (name, entry) = self.entries.first()?;
        tracing::info!(
            target: "config",
            account = %name,
            "no specific account matched; falling back to the first stored account"
        );
        entry.credentials()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORE: &str = r#"{
        "work": {"user": "me@work.com", "pass": "w"},
        "personal": {"user": "me@gmail.com", "pass": "p"},
        "broken": {"user": "half@gmail.com"}
    }"#;

    fn explicit(user: Option<&str>, password: Option<&str>) -> CredentialOverride {
        CredentialOverride {
            user: user.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn explicit_credentials_take_priority() {
        let store = CredentialStore::from_json(STORE).unwrap();
        let resolved = store.resolve(&explicit(Some("x@y.z"), Some("secret"))).unwrap();
        assert_eq!(resolved, Credentials::new("x@y.z", "secret"));
    }

    #[test]
    fn user_only_picks_matching_stored_entry() {
        let store = CredentialStore::from_json(STORE).unwrap();
        let resolved = store.resolve(&explicit(Some("me@gmail.com"), None)).unwrap();
        assert_eq!(resolved, Credentials::new("me@gmail.com", "p"));
    }

    #[test]
    fn unmatched_or_incomplete_falls_back_to_first_entry() {
        let store = CredentialStore::from_json(STORE).unwrap();
        let first = Credentials::new("me@work.com", "w");
        assert_eq!(store.resolve(&explicit(Some("nobody@x.y"), None)), Some(first.clone()));
        assert_eq!(store.resolve(&explicit(Some("half@gmail.com"), None)), Some(first.clone()));
        assert_eq!(store.resolve(&CredentialOverride::default()), Some(first));
    }

    #[test]
    fn empty_store_without_override_resolves_to_none() {
        let store = CredentialStore::default();
        assert!(store.resolve(&explicit(Some("me@x.y"), None)).is_none());
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CredentialStore::load(&dir.path().join("none.json")).is_empty());
    }

    #[test]
    fn malformed_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("email_data.json");
        fs::write(&path, "{not json").unwrap();
        assert!(CredentialStore::load(&path).is_empty());
    }

    #[test]
    fn debug_output_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("me@x.y", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
