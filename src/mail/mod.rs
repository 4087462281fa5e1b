mod imap_client;
pub mod normalizer;
pub mod servers;
mod session;

pub use imap_client::{ImapConnection, ImapEndpoint};
pub use normalizer::{normalize, BodyPolicy, NormalizeError};
pub use session::{MailboxError, MailboxSession, SharedSession};
