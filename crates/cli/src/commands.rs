use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Incrementally sync warehouse tables into a local database file
    Sync {
        /// Path to the credentials file
        #[arg(short = 'k', long, default_value = "service_account.json")]
        credentials: PathBuf,

        /// Dataset to replicate
        #[arg(short, long)]
        dataset: String,

        /// Project owning the dataset; defaults to the credentials' project
        #[arg(short, long)]
        project: Option<String>,

        /// Path to the local database file
        #[arg(long, default_value = "lakesync.db")]
        db: PathBuf,

        /// Name of a specific table to sync
        #[arg(short, long)]
        table: Option<String>,

        /// Minutes between sync cycles
        #[arg(long, default_value_t = 15)]
        interval_mins: u64,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Export warehouse tables to parquet files
    Export {
        /// Path to the credentials file
        #[arg(short = 'k', long, default_value = "service_account.json")]
        credentials: PathBuf,

        /// Dataset to export
        #[arg(short, long)]
        dataset: String,

        /// Project owning the dataset; defaults to the credentials' project
        #[arg(short, long)]
        project: Option<String>,

        /// Path to the directory to which exports will be saved
        #[arg(short, long)]
        output: PathBuf,

        /// Export a bounded random sample from each table instead of the
        /// incremental delta
        #[arg(short, long)]
        sample: bool,

        /// Number of concurrent per-table tasks
        #[arg(short, long, default_value_t = 1)]
        concurrency: usize,

        /// Name of a specific table to export
        #[arg(short, long)]
        table: Option<String>,

        /// Minutes between export cycles
        #[arg(long, default_value_t = 60)]
        interval_mins: u64,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
}
