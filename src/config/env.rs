use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use super::credentials::CredentialOverride;
use crate::mail::{servers, BodyPolicy, ImapEndpoint};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: CredentialOverride,
    pub imap: ImapConfig,
    pub mailbox: MailboxConfig,
    pub directories: DirectoryConfig,
    pub model: ModelConfig,
    pub body_policy: BodyPolicy,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: Option<String>,
    pub port: u16,
    pub timeout: Duration,
}

impl ImapConfig {
    pub fn endpoint_for(&self, user: &str) -> Result<ImapEndpoint, ConfigError> {
        let host = match &self.host {
            Some(host) => host.clone(),
            None => servers::imap_host_for(user)
                .map(str::to_string)
                .ok_or_else(|| {
                    let domain = user.rsplit('@').next().unwrap_or(user);
                    ConfigError::UnknownServer(domain.to_string())
                })?,
        };
        Ok(ImapEndpoint {
            host,
            port: self.port,
            timeout: self.timeout,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MailboxConfig {
    pub inbox: String,
    pub quarantine_folder: String,
    pub scan_limit: usize,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub rules_filename: String,
    pub credentials_filename: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub train_command: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("mail server for '{0}' is not known; set IMAP_HOST or use a full address of a known provider")]
    UnknownServer(String),
}
