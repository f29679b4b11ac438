mod display;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use contract_intel_core::present;
use contract_intel_sync::config::{DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL};
use contract_intel_sync::{
    ClientConfig, ContractClient, ContractService, Lookup, Snapshot, Synchronizer, UploadFile,
    outcome_message,
};
use serde::Serialize;
use tokio::sync::watch;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "contract-intel: follow contracts through the processing service",
    long_about = None
)]
struct Cli {
    /// Base URL of the contract service.
    #[arg(long, env = "CONTRACT_INTEL_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    api_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "CONTRACT_INTEL_TIMEOUT", default_value_t = 30, global = true)]
    timeout: u64,

    /// Emit JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the contract list once.
    List,

    /// Keep the contract list up to date until interrupted.
    Watch {
        /// Seconds between refreshes.
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
        interval: u64,

        /// Upload this file once the view is running.
        #[arg(long)]
        upload: Option<PathBuf>,
    },

    /// Show one contract's details and extracted data.
    Show { id: String },

    /// Look up a contract's processing status by id.
    Status {
        id: String,

        /// Open the detail view for the contract when it is found.
        #[arg(long)]
        details: bool,
    },

    /// Submit a file for processing. Only the first file is sent.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();
    tracing::info!("contract-intel v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::new(&cli.api_url)?
        .with_request_timeout(Duration::from_secs(cli.timeout));
    let client = Arc::new(ContractClient::new(&config)?);

    match cli.command {
        Commands::List => list(client, cli.json).await,
        Commands::Watch { interval, upload } => {
            let config = config.with_poll_interval(Duration::from_secs(interval))?;
            watch(client, config.poll_interval, upload, cli.json).await
        }
        Commands::Show { id } => show(&client, &id, cli.json).await,
        Commands::Status { id, details } => status(&client, &id, details, cli.json).await,
        Commands::Upload { files } => upload(client, &files, cli.json).await,
    }
}

async fn list(client: Arc<ContractClient>, json: bool) -> anyhow::Result<ExitCode> {
    let sync = Synchronizer::new(client.clone());
    let snapshot = sync.refresh().await?;
    print_list(&client, &snapshot, json)?;
    Ok(ExitCode::SUCCESS)
}

async fn watch(
    client: Arc<ContractClient>,
    interval: Duration,
    upload: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let sync = Arc::new(Synchronizer::new(client.clone()));
    let updates = sync.subscribe();
    let poller = sync.start_polling(interval);

    if let Some(path) = upload {
        let file = UploadFile::from_path(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let name = file.file_name.clone();
        let result = sync.upload(file).await;
        eprintln!("{}", outcome_message(&name, &result));
    }

    follow(updates, tokio::signal::ctrl_c(), |snapshot| {
        print_list(&client, snapshot, json)
    })
    .await?;

    poller.stop().await;
    Ok(ExitCode::SUCCESS)
}

/// Hand every applied snapshot whose contract list differs from the last one
/// shown to `on_change`, until `shutdown` resolves or the synchronizer is gone.
///
/// `shutdown` is polled across iterations, so it is not missed while
/// `on_change` runs.
async fn follow<F>(
    mut updates: watch::Receiver<Arc<Snapshot>>,
    shutdown: F,
    mut on_change: impl FnMut(&Snapshot) -> anyhow::Result<()>,
) -> anyhow::Result<()>
where
    F: Future,
{
    tokio::pin!(shutdown);
    let mut shown: Option<Arc<Snapshot>> = None;
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = Arc::clone(&updates.borrow_and_update());
                let unchanged = shown
                    .as_ref()
                    .is_some_and(|prev| prev.contracts() == snapshot.contracts());
                if !unchanged {
                    on_change(&snapshot)?;
                    shown = Some(snapshot);
                }
            }
            _ = &mut shutdown => break,
        }
    }
    Ok(())
}

async fn show(client: &ContractClient, id: &str, json: bool) -> anyhow::Result<ExitCode> {
    let contract = match client.get_contract(id).await {
        Ok(contract) => contract,
        Err(e) => {
            eprintln!("Error: {}", display::detail_error_message(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    let view = present(&contract);
    if json {
        print_json(&view)?;
    } else {
        let url = client.download_url(&contract.id);
        display::write_detail(&mut io::stdout().lock(), &view, Some(url.as_str()))?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn status(
    client: &Arc<ContractClient>,
    id: &str,
    details: bool,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let lookup = Lookup::new(client.clone());
    let report = match lookup.find_status(id).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    if json {
        print_json(&StatusJson {
            id: &report.id,
            status: report.status.as_str(),
        })?;
    } else {
        display::write_status_report(&mut io::stdout().lock(), &report)?;
    }

    if details {
        println!();
        return show(client, &report.id, json).await;
    }
    Ok(ExitCode::SUCCESS)
}

async fn upload(
    client: Arc<ContractClient>,
    files: &[PathBuf],
    json: bool,
) -> anyhow::Result<ExitCode> {
    let file = UploadFile::first_of(files)
        .await
        .context("reading upload file")?
        .context("no file given")?;
    let name = file.file_name.clone();

    let sync = Synchronizer::new(client.clone());
    let result = sync.upload(file).await;
    let message = outcome_message(&name, &result);

    let Ok(receipt) = result else {
        eprintln!("{message}");
        return Ok(ExitCode::FAILURE);
    };

    let snapshot = sync.snapshot();
    if json {
        print_json(&UploadJson {
            message: &message,
            contract_id: &receipt.contract_id,
            contracts: snapshot.contracts(),
        })?;
    } else {
        println!("{message}");
        println!();
        print_list(&client, &snapshot, false)?;
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct StatusJson<'a> {
    id: &'a str,
    status: &'a str,
}

#[derive(Serialize)]
struct UploadJson<'a> {
    message: &'a str,
    contract_id: &'a str,
    contracts: &'a [contract_intel_core::Contract],
}

fn print_list(client: &ContractClient, snapshot: &Snapshot, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&snapshot.contracts());
    }
    let mut out = io::stdout().lock();
    display::write_contract_table(&mut out, snapshot, &|id| client.download_url(id))?;
    out.flush()?;
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
