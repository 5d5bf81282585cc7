use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use humansize::{format_size, DECIMAL};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bucketsync::sync::{Direction, DispatchPolicy};
use bucketsync::{logging, AuthContext, ObjectStore, S3Store, Settings, SyncEngine, SyncError, SyncPair};

#[derive(Parser)]
#[command(name = "bucketsync")]
#[command(version)]
#[command(about = "Sync a local directory with an S3 bucket prefix, transferring only changed files")]
#[command(long_about = r#"
Exactly one of SOURCE and TARGET must be an s3://bucket/prefix locator.

Examples:
  bucketsync ./site s3://my-bucket/www      Upload changed files
  bucketsync s3://my-bucket/www ./site      Download changed files

Credentials come from AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY or the
standard AWS credential chain.
"#)]
struct Cli {
    /// Source endpoint (local directory or s3://bucket/prefix)
    source: String,

    /// Target endpoint (local directory or s3://bucket/prefix)
    target: String,

    /// Maximum transfers in flight
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Dispatch policy: pool or batch
    #[arg(long)]
    policy: Option<DispatchPolicy>,

    /// Endpoint template for S3-compatible storage, `{region}` is substituted
    #[arg(long)]
    endpoint: Option<String>,

    /// Comma separated candidate regions for bucket lookup
    #[arg(long, value_delimiter = ',')]
    regions: Vec<String>,

    /// Config file (defaults to <config dir>/bucketsync/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show what would be transferred without transferring
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "Sync failed:".red().bold(), err);
            if let Some(sync_err) = err.downcast_ref::<SyncError>() {
                let completed = sync_err.completed_paths();
                if !completed.is_empty() {
                    eprintln!("{} completed before the failure:", completed.len());
                    for path in completed {
                        eprintln!("  {}", path);
                    }
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(concurrency) = cli.concurrency {
        settings.concurrency = concurrency;
    }
    if let Some(policy) = cli.policy {
        settings.policy = policy;
    }
    if cli.endpoint.is_some() {
        settings.endpoint = cli.endpoint;
    }
    if !cli.regions.is_empty() {
        settings.regions = cli.regions;
    }
    settings.dry_run |= cli.dry_run;

    let pair = SyncPair::new(&cli.source, &cli.target, AuthContext::from_env(), settings.concurrency)?;

    let mut store = S3Store::new(pair.auth().clone());
    if let Some(endpoint) = &settings.endpoint {
        store = store.with_endpoint(endpoint);
    }
    let store: Arc<dyn ObjectStore> = Arc::new(store);

    let engine = SyncEngine::new(store, settings.sync_options());
    let report = engine.sync(&pair).await?;

    let verb = match (report.dry_run, report.direction) {
        (true, _) => "Would transfer",
        (false, Direction::Upload) => "Uploaded",
        (false, Direction::Download) => "Downloaded",
    };
    println!(
        "{} {} of {} files ({}) via s3://{} [{}] in {:.1}s",
        verb.green().bold(),
        report.transferred.len(),
        report.source_files,
        format_size(report.bytes_transferred, DECIMAL),
        report.bucket.name,
        report.bucket.region,
        report.duration.as_secs_f64()
    );
    if report.dry_run {
        for path in &report.transferred {
            println!("  {}", path);
        }
    }

    Ok(())
}
