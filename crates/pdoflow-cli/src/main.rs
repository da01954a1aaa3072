//! PDOFlow CLI tool.
//!
//! Translates argv into the same programmatic operations a producer would
//! call directly: spawning/babysitting a worker pool, inspecting postings,
//! administering their status, and running one unit in-process for
//! debugging.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use pdoflow_core::ResourceId;
use tracing_subscriber::EnvFilter;

use error::CliError;
use format::OutputFormat;

#[derive(Parser)]
#[command(name = "pdoflow", about = "PDOFlow distributed job queue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn and supervise a pool of worker processes.
    Pool {
        #[arg(long, default_value_t = 4)]
        max_workers: usize,
        /// How often (in Hz) the pool inspects and refills worker slots.
        #[arg(long, default_value_t = 1.0)]
        upkeep_rate: f64,
        #[arg(long, default_value_t = 10)]
        batchsize: i64,
    },
    /// Show the status of one or more postings.
    PostingStatus {
        ids: Vec<ResourceId>,
        #[arg(long)]
        show_jobs: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Simple)]
        format: OutputFormat,
    },
    /// List every posting.
    ListPostings {
        #[arg(long, value_enum, default_value_t = OutputFormat::Simple)]
        format: OutputFormat,
    },
    /// Administratively set a posting's status.
    SetPostingStatus { id: ResourceId, status: String },
    /// Show waiting-unit counts grouped by priority.
    PriorityStats {
        #[arg(long, value_enum, default_value_t = OutputFormat::Simple)]
        format: OutputFormat,
    },
    /// Run one unit in-process, bypassing the claim algorithm, for debugging.
    ExecuteJob { id: ResourceId },
    /// Internal: run as a single worker process. Spawned by `pool`; not
    /// part of the public command surface.
    #[command(hide = true, name = "worker-run")]
    WorkerRun {
        #[arg(long)]
        worker_id: String,
        #[arg(long, default_value_t = 10)]
        batch_size: i64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Pool {
            max_workers,
            upkeep_rate,
            batchsize,
        } => commands::pool(max_workers, upkeep_rate, batchsize).await,
        Commands::PostingStatus {
            ids,
            show_jobs,
            format,
        } => commands::posting_status(ids, show_jobs, format).await,
        Commands::ListPostings { format } => commands::list_postings(format).await,
        Commands::SetPostingStatus { id, status } => commands::set_posting_status(id, status).await,
        Commands::PriorityStats { format } => commands::priority_stats(format).await,
        Commands::ExecuteJob { id } => commands::execute_job(id).await,
        Commands::WorkerRun { worker_id, batch_size } => commands::worker_run(worker_id, batch_size).await,
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(exit_code(&err));
    }
}

fn exit_code(err: &CliError) -> i32 {
    err.exit_code()
}
