//! drive-mirror - one-way folder mirror between two Google Drive accounts
//!
//! Every root folder of the source account and every ordinary file directly
//! inside it is recreated in the destination account under the same title.
//! Items that already exist in the destination are left untouched and
//! nothing is ever deleted, so repeated runs are safe.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bridge_traits::time::LogLevel;
use clap::Parser;
use core_runtime::events::RecvError;
use core_runtime::{init_logging, CoreConfig, LogFormat, LoggingConfig};
use core_service::CoreService;
use tracing::warn;

#[derive(Debug, Parser)]
#[command(name = "drive-mirror", version, about = "Mirror root folders between two Google Drive accounts")]
struct Cli {
    /// Account file of the source account
    #[arg(long, default_value = core_runtime::config::DEFAULT_SOURCE_ACCOUNT)]
    source: PathBuf,

    /// Account file of the destination account
    #[arg(long, default_value = core_runtime::config::DEFAULT_DESTINATION_ACCOUNT)]
    destination: PathBuf,

    /// Folders processed concurrently
    #[arg(long, default_value_t = 1)]
    collections: usize,

    /// Files transferred concurrently within a folder
    #[arg(long, default_value_t = 4)]
    files: usize,

    /// Record failed items and keep going instead of stopping at the first error
    #[arg(long)]
    isolate_failures: bool,

    /// Attempts per create, including the first (1 = no retry)
    #[arg(long, default_value_t = 1)]
    retry_attempts: u32,

    /// Log output format: pretty, json or compact
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Print every mirror event as a JSON line on stdout
    #[arg(long)]
    events_json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn logging(&self) -> LoggingConfig {
        let level = match self.verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        };
        let logging = LoggingConfig::default().with_level(level);
        match self.log_format {
            Some(format) => logging.with_format(format),
            None => logging,
        }
    }

    fn core_config(&self) -> Result<CoreConfig> {
        CoreConfig::builder()
            .source_account(&self.source)
            .destination_account(&self.destination)
            .max_concurrent_collections(self.collections)
            .max_concurrent_files(self.files)
            .isolate_failures(self.isolate_failures)
            .create_retry_attempts(self.retry_attempts)
            .logging(self.logging())
            .build()
            .context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.core_config()?;
    init_logging(config.logging.clone()).context("Failed to initialize logging")?;

    let service = CoreService::new(config);
    let printer = cli.events_json.then(|| {
        let mut events = service.events().subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => warn!("Failed to encode event: {}", e),
                    },
                    Err(RecvError::Lagged(missed)) => warn!("Event output skipped {} events", missed),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    let outcome = service.run().await;
    drop(service);
    if let Some(printer) = printer {
        printer.await.ok();
    }

    let report = outcome.context("Mirror run failed")?;
    eprintln!("{}", report);
    for failure in &report.failures {
        match &failure.title {
            Some(title) => eprintln!("  failed: {}/{}: {}", failure.collection, title, failure.message),
            None => eprintln!("  failed: {}: {}", failure.collection, failure.message),
        }
    }

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
