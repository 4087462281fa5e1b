use std::sync::Arc;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;

use crate::{
    classifier::{ArtifactProducer, CommandProducer, ModelStore, NaiveBayesModel},
    config::{AppConfig, CredentialStore, Credentials},
    domain::{QuarantineOutcome, ScanReport},
    infrastructure::directories::ResolvedPaths,
    mail::{ImapConnection, MailboxSession, SharedSession},
    rules::{load_rule_file, RuleTable},
    tasks::{self, QuarantineError, ScanError, ScanOptions, SpamSink},
};

#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub limit: Option<usize>,
    pub train_if_missing: bool,
}

/// Wires configuration and on-disk inputs to the triage engine. Rule table, model and
/// credentials are re-read on every call; nothing is cached between scans.
pub struct TriageApp {
    config: Arc<AppConfig>,
    paths: ResolvedPaths,
}

impl TriageApp {
    pub fn new(config: AppConfig, paths: ResolvedPaths) -> Self {
        Self {
            config: Arc::new(config),
            paths,
        }
    }

    pub fn credentials(&self) -> Result<Credentials, ScanError> {
        let store = CredentialStore::load(&self.paths.credentials_path);
        let credentials = store
            .resolve(&self.config.credentials)
            .ok_or_else(|| ScanError::MissingCredentials(self.paths.credentials_path.clone()))?;
        tracing::info!(target: "config", user = %credentials.user, "email credentials loaded");
        Ok(credentials)
    }

    pub fn connect(&self, credentials: &Credentials) -> Result<SharedSession<ImapConnection>> {
        let endpoint = self.config.imap.endpoint_for(&credentials.user)?;
        let connection = ImapConnection::connect(&endpoint)
            .with_context(|| format!("failed to connect to {}:{}", endpoint.host, endpoint.port))?;
        Ok(Arc::new(Mutex::new(connection)))
    }

    pub fn load_rules(&self) -> Result<RuleTable> {
        load_rule_file(&self.paths.rules_path).context("failed to load override rules")
    }

    pub fn load_classifier(&self, train_if_missing: bool) -> Result<NaiveBayesModel> {
        let store = ModelStore::new(&self.config.model.path);
        let model = match (train_if_missing, self.training_command()) {
            (true, Some(producer)) => store.resolve_or_produce(&producer),
            (true, None) => {
                tracing::warn!(target: "classifier", "MODEL_TRAIN_COMMAND is not set; cannot produce a missing model");
                store.resolve()
            }
            (false, _) => store.resolve(),
        };
        model.context("failed to load or create the machine learning model")
    }

    pub fn train(&self) -> Result<()> {
        let Some(producer) = self.training_command() else {
            bail!("MODEL_TRAIN_COMMAND is not configured");
        };
        let path = &self.config.model.path;
        producer.produce(path)?;
        ModelStore::new(path)
            .resolve()
            .context("training command did not produce a usable model")?;
        tracing::info!(target: "classifier", path = %path.display(), "new model trained and saved");
        Ok(())
    }

    /// One full scan on `session`, holding its lock for the duration.
    pub fn scan<S, K>(
        &self,
        session: &SharedSession<S>,
        credentials: &Credentials,
        request: &ScanRequest,
        sink: &mut K,
    ) -> Result<ScanReport>
    where
        S: MailboxSession,
        K: SpamSink + ?Sized,
    {
        tracing::info!(target: "scanner", "starting email filter process");
        let classifier = self.load_classifier(request.train_if_missing)?;
        let table = self.load_rules()?;
        let options = ScanOptions {
            inbox: self.config.mailbox.inbox.clone(),
            quarantine_folder: self.config.mailbox.quarantine_folder.clone(),
            limit: request.limit.unwrap_or(self.config.mailbox.scan_limit),
            body_policy: self.config.body_policy,
        };

        let mut guard = session.lock();
        let report = tasks::scan(&mut *guard, credentials, &options, &table, &classifier, sink)?;
        Ok(report)
    }

    pub fn quarantine<S>(
        &self,
        session: &SharedSession<S>,
        credentials: &Credentials,
        message_ids: &[String],
    ) -> Result<Vec<(String, Result<QuarantineOutcome, QuarantineError>)>>
    where
        S: MailboxSession,
    {
        let mut guard = session.lock();
        tasks::open_folder(&mut *guard, credentials, &self.config.mailbox.inbox)?;
        Ok(tasks::quarantine_batch(
            &mut *guard,
            &self.config.mailbox.quarantine_folder,
            message_ids,
        ))
    }

    pub fn disconnect<S: MailboxSession>(&self, session: &SharedSession<S>) {
        if let Err(err) = session.lock().logout() {
            tracing::debug!(target: "mail", error = %err, "logout failed");
        }
    }

    fn training_command(&self) -> Option<CommandProducer> {
        self.config
            .model
            .train_command
            .as_deref()
            .and_then(CommandProducer::from_command_line)
    }
}
