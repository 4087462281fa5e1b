pub mod credentials;
pub mod env;
mod loader;

pub use credentials::{CredentialOverride, CredentialStore, Credentials};
pub use env::{
    AppConfig, ConfigError, DirectoryConfig, ImapConfig, LoggingConfig, MailboxConfig,
    ModelConfig,
};
pub use loader::load_config;
