use crate::{commands::Commands, error::CliError};
use clap::Parser;
use engine::{
    error::SyncError,
    orchestrator::{FailurePolicy, SyncOptions, SyncOrchestrator},
    report::CycleOutcome,
};
use sinks::{file::parquet::ParquetSink, sink::Sink, sql::duckdb::DuckDbSink};
use std::{error::Error as _, sync::Arc, time::Duration};
use tokio::time::{self, MissedTickBehavior};
use tracing::{Level, error, info};
use warehouse::{auth::Credentials, rest::RestWarehouse};

mod commands;
mod error;

#[derive(Parser)]
#[command(
    name = "lakesync",
    version = "0.1.0",
    about = "Incremental warehouse-to-local sync tool"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Initialize logger
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            credentials,
            dataset,
            project,
            db,
            table,
            interval_mins,
            once,
        } => {
            let creds = Credentials::from_file(&credentials)?;
            let project = project.unwrap_or_else(|| creds.project_id.clone());
            let warehouse = Arc::new(RestWarehouse::new(&creds)?.with_project(&project));
            let sink: Arc<dyn Sink> = Arc::new(DuckDbSink::open(&db)?);

            let mut options = SyncOptions::new(&dataset);
            options.table = table;
            options.failure_policy = FailurePolicy::Contain;

            let orchestrator = SyncOrchestrator::new(warehouse, sink, &project, options);
            // per-table failures are contained within a cycle; a cycle-level
            // failure is logged and the next scheduled cycle is the retry
            run_schedule(orchestrator, interval_mins, once, false).await
        }
        Commands::Export {
            credentials,
            dataset,
            project,
            output,
            sample,
            concurrency,
            table,
            interval_mins,
            once,
        } => {
            let creds = Credentials::from_file(&credentials)?;
            let project = project.unwrap_or_else(|| creds.project_id.clone());
            let warehouse = Arc::new(RestWarehouse::new(&creds)?.with_project(&project));
            let sink: Arc<dyn Sink> = if sample {
                Arc::new(ParquetSink::sampling(&output))
            } else {
                Arc::new(ParquetSink::new(&output))
            };

            let mut options = SyncOptions::new(&dataset);
            options.table = table;
            options.sample = sample;
            options.concurrency = concurrency;
            options.failure_policy = FailurePolicy::Abort;

            let orchestrator = SyncOrchestrator::new(warehouse, sink, &project, options);
            // file exports fail fast: any per-table error ends the process
            run_schedule(orchestrator, interval_mins, once, true).await
        }
    }
}

async fn run_schedule(
    orchestrator: SyncOrchestrator,
    interval_mins: u64,
    once: bool,
    fail_fast: bool,
) -> Result<(), CliError> {
    // the first cycle runs immediately, then on a fixed wall-clock interval
    run_cycle(&orchestrator, fail_fast).await?;
    if once {
        return Ok(());
    }

    let mut ticker = time::interval(Duration::from_secs(interval_mins * 60));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // the interval's first tick completes immediately
    loop {
        ticker.tick().await;
        run_cycle(&orchestrator, fail_fast).await?;
    }
}

async fn run_cycle(orchestrator: &SyncOrchestrator, fail_fast: bool) -> Result<(), CliError> {
    match orchestrator.run_cycle().await {
        Ok(CycleOutcome::Completed { reports, failed }) => {
            let rows: usize = reports.iter().map(|r| r.rows_written).sum();
            info!(
                tables = reports.len(),
                rows,
                failed = failed.len(),
                "Cycle completed"
            );
            Ok(())
        }
        Ok(CycleOutcome::Skipped) => Ok(()),
        Err(err) => {
            log_error_chain(&err);
            if fail_fast { Err(err.into()) } else { Ok(()) }
        }
    }
}

fn log_error_chain(err: &SyncError) {
    error!("Sync cycle failed: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        error!("  caused by: {cause}");
        source = cause.source();
    }
}
