use std::{env, path::PathBuf, str::FromStr, time::Duration};

use super::{
    credentials::CredentialOverride,
    env::{
        AppConfig, ConfigError, DirectoryConfig, ImapConfig, LoggingConfig, MailboxConfig,
        ModelConfig,
    },
};
use crate::mail::BodyPolicy;

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let credentials = CredentialOverride {
            user: non_empty("MAIL_USER"),
            password: non_empty("MAIL_PASSWORD"),
        };

        let imap = ImapConfig {
            host: non_empty("IMAP_HOST"),
            port: parse_or("IMAP_PORT", 993)?,
            timeout: Duration::from_secs(parse_or("IMAP_TIMEOUT_SECS", 30)?),
        };

        let mailbox = MailboxConfig {
            inbox: env::var("INBOX_FOLDER").unwrap_or_else(|_| "INBOX".to_string()),
            quarantine_folder: env::var("QUARANTINE_FOLDER").unwrap_or_else(|_| "Spam".to_string()),
            scan_limit: parse_or("SCAN_LIMIT", 100)?,
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            rules_filename: env::var("RULES_FILENAME")
                .unwrap_or_else(|_| "keep_data.csv".to_string()),
            credentials_filename: env::var("CREDENTIALS_FILENAME")
                .unwrap_or_else(|_| "email_data.json".to_string()),
        };

        let model = ModelConfig {
            path: PathBuf::from(
                env::var("MODEL_PATH")
                    .unwrap_or_else(|_| "models/spam_classifier.json".to_string()),
            ),
            train_command: non_empty("MODEL_TRAIN_COMMAND"),
        };

        let body_policy = if parse_or("HTML_BODY_FALLBACK", false)? {
            BodyPolicy::HtmlFallback
        } else {
            BodyPolicy::PlainOnly
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        Ok(Self {
            credentials,
            imap,
            mailbox,
            directories,
            model,
            body_policy,
            logging,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty(key) {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
