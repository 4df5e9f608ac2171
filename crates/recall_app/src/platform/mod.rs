mod config;
mod effects;
mod host;
mod logging;
mod runtime;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use recall_engine::{watch_snapshot, DomReader, FileCredentialStore, FilePage, ReqwestRetriever};
use recall_logging::{recall_info, recall_warn};

use config::RecallConfig;
use logging::LogDestination;
use runtime::Runtime;

/// Suggests replies from stored memories for the last message of a chat page.
#[derive(Parser, Debug)]
#[command(name = "recall_app")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTML snapshot of the messaging client; re-read on every poll
    snapshot: PathBuf,

    /// RON configuration file
    #[arg(long, default_value = "recall.ron")]
    config: PathBuf,

    /// JSON file with `idToken` and `expiresAt`; overrides the config
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    log: LogDestination,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

pub fn run_app() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::initialize(args.log, args.verbose);
    recall_info!("Starting recall_app {}", env!("CARGO_PKG_VERSION"));

    let mut config = RecallConfig::load(&args.config)?;
    if let Some(credentials) = args.credentials {
        config.credentials_path = credentials;
    }
    let snapshot = args.snapshot;

    let reader = Arc::new(DomReader::from_table(&config.selectors).context("invalid selectors")?);
    let credentials = Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
    let retriever = Arc::new(
        ReqwestRetriever::new(config.retrieve_settings(), credentials)
            .context("failed to build HTTP client")?,
    );
    let page = Arc::new(FilePage::new(snapshot.clone()));

    let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    tokio_runtime.block_on(async move {
        let (runtime, handle) = Runtime::new(page, reader, retriever, config.timings());

        let mutations = handle.clone();
        // Navigation checks still rebind the input when the watcher is unavailable.
        let _watcher = match watch_snapshot(&snapshot, move || mutations.dom_mutated()) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                recall_warn!("DOM observer unavailable: {}", err);
                None
            }
        };

        let engine = tokio::spawn(runtime.run());
        host::run_stdin(handle).await;
        engine.await.context("runtime task failed")
    })
}
