use std::{
    fmt,
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use native_tls::{TlsConnector, TlsStream};

use super::session::{MailboxError, MailboxSession};
use crate::domain::CreateOutcome;

type TlsClient = imap::Client<TlsStream<TcpStream>>;
type TlsSession = imap::Session<TlsStream<TcpStream>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapEndpoint {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

enum State {
    Connected(Box<TlsClient>),
    Authenticated(Box<TlsSession>),
    Closed,
}

pub struct ImapConnection {
    host: String,
    state: State,
    move_capability: Option<bool>,
}

impl fmt::Debug for ImapConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Connected(_) => "connected",
            State::Authenticated(_) => "authenticated",
            State::Closed => "closed",
        };
        f.debug_struct("ImapConnection")
            .field("host", &self.host)
            .field("state", &state)
            .field("move_capability", &self.move_capability)
            .finish()
    }
}

impl ImapConnection {
    pub fn connect(endpoint: &ImapEndpoint) -> Result<Self, MailboxError> {
        let addr = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                MailboxError::Protocol(format!("no address found for {}", endpoint.host))
            })?;

        let tcp = TcpStream::connect_timeout(&addr, endpoint.timeout)?;
        tcp.set_read_timeout(Some(endpoint.timeout))?;
        tcp.set_write_timeout(Some(endpoint.timeout))?;

        let connector = TlsConnector::builder()
            .build()
            .map_err(|err| MailboxError::Tls(err.to_string()))?;
        let stream = connector
            .connect(endpoint.host.as_str(), tcp)
            .map_err(|err| MailboxError::Tls(err.to_string()))?;

        let mut client = imap::Client::new(stream);
        client.read_greeting().map_err(map_imap_error)?;

        tracing::info!(
            target: "mail",
            host = %endpoint.host,
            port = endpoint.port,
            "connected to IMAP server"
        );
        Ok(Self {
            host: endpoint.host.clone(),
            state: State::Connected(Box::new(client)),
            move_capability: None,
        })
    }

    fn session(&mut self) -> Result<&mut TlsSession, MailboxError> {
        match &mut self.state {
            State::Authenticated(session) => Ok(&mut **session),
            State::Connected(_) => Err(MailboxError::NotAuthenticated),
            State::Closed => Err(MailboxError::ConnectionLost),
        }
    }
}

impl MailboxSession for ImapConnection {
    fn authenticate(&mut self, user: &str, password: &str) -> Result<(), MailboxError> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Connected(client) => match (*client).login(user, password) {
                Ok(session) => {
                    self.state = State::Authenticated(Box::new(session));
                    tracing::info!(target: "mail", host = %self.host, user, "authenticated");
                    Ok(())
                }
                Err((err, client)) => {
                    self.state = State::Connected(Box::new(client));
                    Err(MailboxError::AuthenticationFailed(err.to_string()))
                }
            },
            State::Authenticated(session) => {
                self.state = State::Authenticated(session);
                tracing::debug!(target: "mail", "session already authenticated");
                Ok(())
            }
            State::Closed => Err(MailboxError::ConnectionLost),
        }
    }

    fn select(&mut self, folder: &str) -> Result<(), MailboxError> {
        let mailbox = self.session()?.select(folder).map_err(map_imap_error)?;
        tracing::debug!(target: "mail", folder, exists = mailbox.exists, "folder selected");
        Ok(())
    }

    fn search(&mut self, criteria: &str) -> Result<Vec<String>, MailboxError> {
        let uids = self
            .session()?
            .uid_search(criteria)
            .map_err(map_imap_error)?;
        // UIDs ascend with mailbox order; the binding hands back an unordered set.
        let mut uids: Vec<u32> = uids.into_iter().collect();
        uids.sort_unstable();
        Ok(uids.into_iter().map(|uid| uid.to_string()).collect())
    }

    fn fetch(&mut self, id: &str) -> Result<Vec<u8>, MailboxError> {
        let uid = parse_uid(id)?;
        let fetches = self
            .session()?
            .uid_fetch(uid.to_string(), "RFC822")
            .map_err(map_imap_error)?;
        fetches
            .iter()
            .find_map(|fetch| fetch.body())
            .map(<[u8]>::to_vec)
            .ok_or_else(|| MailboxError::MissingBody(id.to_string()))
    }

    fn create(&mut self, folder: &str) -> Result<CreateOutcome, MailboxError> {
        match self.session()?.create(folder) {
            Ok(()) => Ok(CreateOutcome::Created),
            Err(imap::Error::No(message)) if mentions_existing(&message) => {
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(err) => Err(map_imap_error(err)),
        }
    }

    fn supports_move(&mut self) -> Result<bool, MailboxError> {
        if let Some(supported) = self.move_capability {
            return Ok(supported);
        }
        let supported = self
            .session()?
            .capabilities()
            .map_err(map_imap_error)?
            .has_str("MOVE");
        tracing::debug!(target: "mail", supported, "MOVE capability");
        self.move_capability = Some(supported);
        Ok(supported)
    }

    fn move_to(&mut self, id: &str, folder: &str) -> Result<(), MailboxError> {
        let uid = parse_uid(id)?;
        match self.session()?.uid_mv(uid.to_string(), folder) {
            Ok(()) => Ok(()),
            Err(imap::Error::Bad(message)) => Err(MailboxError::Unsupported(message)),
            Err(err) => Err(map_imap_error(err)),
        }
    }

    fn copy_to(&mut self, id: &str, folder: &str) -> Result<(), MailboxError> {
        let uid = parse_uid(id)?;
        self.session()?
            .uid_copy(uid.to_string(), folder)
            .map_err(map_imap_error)
    }

    fn mark_deleted(&mut self, id: &str) -> Result<(), MailboxError> {
        let uid = parse_uid(id)?;
        self.session()?
            .uid_store(uid.to_string(), "+FLAGS (\\Deleted)")
            .map(|_| ())
            .map_err(map_imap_error)
    }

    fn purge(&mut self) -> Result<(), MailboxError> {
        self.session()?
            .expunge()
            .map(|_| ())
            .map_err(map_imap_error)
    }

    fn logout(&mut self) -> Result<(), MailboxError> {
        let result = match &mut self.state {
            State::Authenticated(session) => session.logout().map_err(map_imap_error),
            _ => Ok(()),
        };
        self.state = State::Closed;
        result
    }
}

fn parse_uid(id: &str) -> Result<u32, MailboxError> {
    id.trim()
        .parse::<u32>()
        .ok()
        .filter(|uid| *uid > 0)
        .ok_or_else(|| MailboxError::InvalidId(id.to_string()))
}

fn mentions_existing(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("[alreadyexists]") {
        return true;
    }
    // Servers without RFC 5530 response codes only say so in the text.
    lowered.contains("exists")
}

fn map_imap_error(err: imap::Error) -> MailboxError {
    match err {
        imap::Error::Io(err) => MailboxError::Io(err),
        imap::Error::ConnectionLost => MailboxError::ConnectionLost,
        imap::Error::No(message) => MailboxError::No(message),
        imap::Error::Bad(message) => MailboxError::Bad(message),
        other => MailboxError::Protocol(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uids_must_be_positive_integers() {
        assert_eq!(parse_uid("42").unwrap(), 42);
        assert_eq!(parse_uid(" 7 ").unwrap(), 7);
        assert!(matches!(parse_uid("0"), Err(MailboxError::InvalidId(_))));
        assert!(matches!(parse_uid("1:*"), Err(MailboxError::InvalidId(_))));
        assert!(matches!(parse_uid(""), Err(MailboxError::InvalidId(_))));
    }

    #[test]
    fn create_refusals_for_existing_folders_are_recognised() {
        assert!(mentions_existing("[ALREADYEXISTS] Duplicate mailbox name"));
        assert!(mentions_existing("Folder exists"));
        assert!(!mentions_existing("[NOPERM] Permission denied"));
        assert!(!mentions_existing("[CANNOT] Invalid mailbox name"));
    }

    #[test]
    fn connection_errors_are_fatal() {
        assert!(map_imap_error(imap::Error::ConnectionLost).is_fatal());
        assert!(!map_imap_error(imap::Error::No("nope".into())).is_fatal());
    }
}
