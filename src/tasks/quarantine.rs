use thiserror::Error;

use crate::{
    domain::QuarantineOutcome,
    mail::{MailboxError, MailboxSession},
};

#[derive(Debug, Error)]
pub enum QuarantineError {
    #[error("invalid message id {0:?}")]
    InvalidId(String),
    #[error("failed to query move capability: {0}")]
    Capability(#[source] MailboxError),
    #[error("failed to move message {id}: {source}")]
    Move {
        id: String,
        #[source]
        source: MailboxError,
    },
    #[error("failed to copy message {id}: {source}")]
    Copy {
        id: String,
        #[source]
        source: MailboxError,
    },
    #[error("failed to mark message {id} deleted: {source}")]
    MarkDeleted {
        id: String,
        #[source]
        source: MailboxError,
    },
    #[error("failed to purge deleted messages after copying {id}: {source}")]
    Purge {
        id: String,
        #[source]
        source: MailboxError,
    },
}

/// Relocates one message into `folder`, preferring an atomic move and falling back to
/// copy, mark deleted, purge. Expects the message's current folder to be selected.
pub fn quarantine<S>(
    session: &mut S,
    folder: &str,
    message_id: &str,
) -> Result<QuarantineOutcome, QuarantineError>
where
    S: MailboxSession + ?Sized,
{
    if message_id.is_empty() || !message_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QuarantineError::InvalidId(message_id.to_string()));
    }

    if session.supports_move().map_err(QuarantineError::Capability)? {
        match session.move_to(message_id, folder) {
            Ok(()) => {
                tracing::info!(target: "quarantine", message_id, folder, "message moved to quarantine");
                return Ok(QuarantineOutcome::Moved);
            }
            Err(MailboxError::Unsupported(reason)) => {
                tracing::warn!(
                    target: "quarantine",
                    message_id,
                    %reason,
                    "atomic move refused; falling back to copy and purge"
                );
            }
            Err(source) => {
                return Err(QuarantineError::Move {
                    id: message_id.to_string(),
                    source,
                })
            }
        }
    }

    let id = || message_id.to_string();
    session
        .copy_to(message_id, folder)
        .map_err(|source| QuarantineError::Copy { id: id(), source })?;
    session
        .mark_deleted(message_id)
        .map_err(|source| QuarantineError::MarkDeleted { id: id(), source })?;
    session
        .purge()
        .map_err(|source| QuarantineError::Purge { id: id(), source })?;

    tracing::info!(target: "quarantine", message_id, folder, "message copied to quarantine and purged");
    Ok(QuarantineOutcome::CopiedAndPurged)
}

pub fn quarantine_batch<S>(
    session: &mut S,
    folder: &str,
    message_ids: &[String],
) -> Vec<(String, Result<QuarantineOutcome, QuarantineError>)>
where
    S: MailboxSession + ?Sized,
{
    if message_ids.is_empty() {
        tracing::info!(target: "quarantine", "no emails selected");
        return Vec::new();
    }

    let mut results = Vec::with_capacity(message_ids.len());
    for id in message_ids {
        let result = quarantine(session, folder, id);
        if let Err(err) = &result {
            tracing::error!(target: "quarantine", message_id = %id, error = %err, "error moving email to quarantine");
        }
        results.push((id.clone(), result));
    }
    results
}
