use std::path::PathBuf;

use chrono::Utc;
use thiserror::Error;

use super::sink::SpamSink;
use crate::{
    classifier::Classifier,
    config::Credentials,
    domain::{ScanReport, SpamHit},
    engine::classify,
    mail::{normalize, BodyPolicy, MailboxError, MailboxSession},
    rules::RuleTable,
};

const SEARCH_ALL: &str = "ALL";
const SUBJECT_PREVIEW_CHARS: usize = 30;

/// Errors that abort a scan. Per-message problems are logged and skipped instead.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(
        "email credentials are missing or incomplete: set MAIL_USER and MAIL_PASSWORD or add an account to {}",
        .0.display()
    )]
    MissingCredentials(PathBuf),
    #[error("authentication failed: {0}")]
    Authentication(#[source] MailboxError),
    #[error("failed to select folder {folder}: {source}")]
    Select {
        folder: String,
        #[source]
        source: MailboxError,
    },
    #[error("failed to list messages: {0}")]
    Search(#[source] MailboxError),
    #[error("connection failed during scan: {0}")]
    Connection(#[source] MailboxError),
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub inbox: String,
    pub quarantine_folder: String,
    pub limit: usize,
    pub body_policy: BodyPolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            inbox: "INBOX".to_string(),
            quarantine_folder: "Spam".to_string(),
            limit: 100,
            body_policy: BodyPolicy::PlainOnly,
        }
    }
}

pub fn open_folder<S>(
    session: &mut S,
    credentials: &Credentials,
    folder: &str,
) -> Result<(), ScanError>
where
    S: MailboxSession + ?Sized,
{
    tracing::info!(target: "scanner", user = %credentials.user, "connecting to email server");
    session
        .authenticate(&credentials.user, &credentials.password)
        .map_err(ScanError::Authentication)?;
    session.select(folder).map_err(|source| ScanError::Select {
        folder: folder.to_string(),
        source,
    })?;
    Ok(())
}

/// Classifies up to `options.limit` inbox messages, pushing each spam hit to `sink` as found.
pub fn scan<S, K>(
    session: &mut S,
    credentials: &Credentials,
    options: &ScanOptions,
    table: &RuleTable,
    classifier: &dyn Classifier,
    sink: &mut K,
) -> Result<ScanReport, ScanError>
where
    S: MailboxSession + ?Sized,
    K: SpamSink + ?Sized,
{
    let started_at = Utc::now();
    open_folder(session, credentials, &options.inbox)?;

    let ids: Vec<String> = session
        .search(SEARCH_ALL)
        .map_err(ScanError::Search)?
        .into_iter()
        .take(options.limit)
        .collect();
    tracing::info!(target: "scanner", count = ids.len(), limit = options.limit, "connection successful; fetching emails");

    let quarantine_folder = match session.create(&options.quarantine_folder) {
        Ok(outcome) => {
            tracing::info!(
                target: "scanner",
                folder = %options.quarantine_folder,
                ?outcome,
                "quarantine folder ready"
            );
            Some(outcome)
        }
        Err(err) if err.is_fatal() => return Err(ScanError::Connection(err)),
        Err(err) => {
            tracing::warn!(
                target: "scanner",
                folder = %options.quarantine_folder,
                error = %err,
                "failed to create quarantine folder"
            );
            None
        }
    };

    let mut spam = 0;
    let mut skipped = 0;
    for id in &ids {
        let raw = match session.fetch(id) {
            Ok(raw) => raw,
            Err(err) if err.is_fatal() => return Err(ScanError::Connection(err)),
            Err(err) => {
                tracing::warn!(target: "scanner", message_id = %id, error = %err, "failed to fetch message; skipping");
                skipped += 1;
                continue;
            }
        };

        let message = match normalize(&raw, options.body_policy) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(target: "scanner", message_id = %id, error = %err, "failed to decode message; skipping");
                skipped += 1;
                continue;
            }
        };

        if classify(&message, table, classifier).is_spam() {
            let preview: String = message.subject.chars().take(SUBJECT_PREVIEW_CHARS).collect();
            tracing::info!(
                target: "scanner",
                message_id = %id,
                from = %message.sender,
                subject = %preview,
                "spam detected"
            );
            spam += 1;
            sink.on_spam_hit(SpamHit::new(id.clone(), message));
        }
    }

    let report = ScanReport {
        started_at,
        finished_at: Utc::now(),
        inspected: ids.len(),
        spam,
        skipped,
        quarantine_folder,
    };
    tracing::info!(
        target: "scanner",
        inspected = report.inspected,
        spam = report.spam,
        skipped = report.skipped,
        "email filtering complete"
    );
    Ok(report)
}
