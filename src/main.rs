use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use spam_triage::{
    app::{ScanRequest, TriageApp},
    config,
    domain::SpamHit,
    infrastructure::{directories, logging, shutdown},
};

#[derive(Parser)]
#[command(name = "spam-triage", version, about = "Classify inbox messages and quarantine spam")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the inbox and list suspected spam
    Scan {
        /// Maximum number of messages to inspect
        #[arg(long)]
        limit: Option<usize>,
        /// Move every detected message to the quarantine folder
        #[arg(long)]
        quarantine: bool,
        /// Run MODEL_TRAIN_COMMAND when the model artifact is missing
        #[arg(long)]
        train_if_missing: bool,
    },
    /// Move the given messages (by UID) to the quarantine folder
    Quarantine {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Run MODEL_TRAIN_COMMAND to produce a fresh model artifact
    Train,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories, &config.model.path)?;
    logging::init_tracing(&config.logging, &paths.logs_dir)?;

    let (shutdown, mut listener) = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown);

    let app = TriageApp::new(config, paths);
    let work = tokio::task::spawn_blocking(move || run(&app, cli.command));

    tokio::select! {
        joined = work => {
            let result = joined.context("triage task panicked")?;
            if let Err(err) = &result {
                tracing::error!(error = %format!("{err:#}"), "operation failed");
            }
            tracing::info!("process completed");
            result
        }
        signal = listener.recv() => {
            tracing::warn!(?signal, "interrupted; dropping the connection and abandoning the in-flight operation");
            process::exit(signal.exit_code());
        }
    }
}

fn run(app: &TriageApp, command: Command) -> Result<()> {
    match command {
        Command::Scan {
            limit,
            quarantine,
            train_if_missing,
        } => {
            let credentials = app.credentials()?;
            let session = app.connect(&credentials)?;
            let request = ScanRequest {
                limit,
                train_if_missing,
            };

            let mut hits = Vec::new();
            let mut sink = |hit: SpamHit| {
                println!("{}\t{}\t{}", hit.message_id, hit.sender, hit.subject);
                hits.push(hit.message_id);
            };
            let scanned = app.scan(&session, &credentials, &request, &mut sink);
            let report = match scanned {
                Ok(report) => report,
                Err(err) => {
                    app.disconnect(&session);
                    return Err(err);
                }
            };
            println!(
                "inspected {} message(s), {} spam, {} skipped",
                report.inspected, report.spam, report.skipped
            );

            let outcome = if quarantine {
                move_all(app, &session, &credentials, &hits)
            } else {
                Ok(())
            };
            app.disconnect(&session);
            outcome
        }
        Command::Quarantine { ids } => {
            let credentials = app.credentials()?;
            let session = app.connect(&credentials)?;
            let outcome = move_all(app, &session, &credentials, &ids);
            app.disconnect(&session);
            outcome
        }
        Command::Train => app.train(),
    }
}

fn move_all<S>(
    app: &TriageApp,
    session: &spam_triage::mail::SharedSession<S>,
    credentials: &spam_triage::config::Credentials,
    ids: &[String],
) -> Result<()>
where
    S: spam_triage::mail::MailboxSession,
{
    let results = app.quarantine(session, credentials, ids)?;
    let mut failed = 0;
    for (id, result) in &results {
        match result {
            Ok(outcome) => println!("{id}\t{outcome}"),
            Err(err) => {
                failed += 1;
                println!("{id}\tfailed: {err}");
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} message(s) could not be quarantined", results.len());
    }
    Ok(())
}
