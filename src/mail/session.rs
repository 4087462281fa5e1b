use std::{io, sync::Arc};

use parking_lot::Mutex;
use thiserror::Error;

use crate::domain::CreateOutcome;

/// A mailbox connection guarded for single-writer use. Hold the lock for a whole scan
/// or quarantine batch; the session protocol is not safe to interleave.
pub type SharedSession<S> = Arc<Mutex<S>>;

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("session is not authenticated")]
    NotAuthenticated,
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("operation not supported by server: {0}")]
    Unsupported(String),
    #[error("server refused command: {0}")]
    No(String),
    #[error("server rejected command: {0}")]
    Bad(String),
    #[error("connection lost")]
    ConnectionLost,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("message {0} has no body")]
    MissingBody(String),
    #[error("invalid message id {0:?}")]
    InvalidId(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl MailboxError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MailboxError::NotAuthenticated
                | MailboxError::ConnectionLost
                | MailboxError::Io(_)
                | MailboxError::Tls(_)
        )
    }
}

/// The mailbox operations the triage engine consumes. Identifiers are persistent
/// unique ids (IMAP UIDs), never transient sequence numbers.
pub trait MailboxSession {
    fn authenticate(&mut self, user: &str, password: &str) -> Result<(), MailboxError>;

    fn select(&mut self, folder: &str) -> Result<(), MailboxError>;

    /// Identifiers matching `criteria`, in mailbox order.
    fn search(&mut self, criteria: &str) -> Result<Vec<String>, MailboxError>;

    fn fetch(&mut self, id: &str) -> Result<Vec<u8>, MailboxError>;

    /// Idempotent: an existing folder is reported as `AlreadyExists`, not an error.
    fn create(&mut self, folder: &str) -> Result<CreateOutcome, MailboxError>;

    /// Whether the server offers an atomic move. Implementations query this once per connection.
    fn supports_move(&mut self) -> Result<bool, MailboxError>;

    fn move_to(&mut self, id: &str, folder: &str) -> Result<(), MailboxError>;

    fn copy_to(&mut self, id: &str, folder: &str) -> Result<(), MailboxError>;

    fn mark_deleted(&mut self, id: &str) -> Result<(), MailboxError>;

    fn purge(&mut self) -> Result<(), MailboxError>;

    fn logout(&mut self) -> Result<(), MailboxError> {
        Ok(())
    }
}

impl<S: MailboxSession + ?Sized> MailboxSession for &mut S {
    fn authenticate(&mut self, user: &str, password: &str) -> Result<(), MailboxError> {
        (**self).authenticate(user, password)
    }

    fn select(&mut self, folder: &str) -> Result<(), MailboxError> {
        (**self).select(folder)
    }

    fn search(&mut self, criteria: &str) -> Result<Vec<String>, MailboxError> {
        (**self).search(criteria)
    }

    fn fetch(&mut self, id: &str) -> Result<Vec<u8>, MailboxError> {
        (**self).fetch(id)
    }

    fn create(&mut self, folder: &str) -> Result<CreateOutcome, MailboxError> {
        (**self).create(folder)
    }

    fn supports_move(&mut self) -> Result<bool, MailboxError> {
        (**self).supports_move()
    }

    fn move_to(&mut self, id: &str, folder: &str) -> Result<(), MailboxError> {
        (**self).move_to(id, folder)
    }

    fn copy_to(&mut self, id: &str, folder: &str) -> Result<(), MailboxError> {
        (**self).copy_to(id, folder)
    }

    fn mark_deleted(&mut self, id: &str) -> Result<(), MailboxError> {
        (**self).mark_deleted(id)
    }

    fn purge(&mut self) -> Result<(), MailboxError> {
        (**self).purge()
    }

    fn logout(&mut self) -> Result<(), MailboxError> {
        (**self).logout()
    }
}
