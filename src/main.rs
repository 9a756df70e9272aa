use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod extract;
mod fetch;
mod merge;
mod query;
mod scrape;
mod store;
mod types;

pub use types::*;

#[derive(Parser)]
#[command(name = "email-scrape")]
#[command(about = "Search-engine email discovery for contact lists")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape emails for every subject in the input list
    Run {
        /// Input CSV: name in column 1, numeric identifier in column 2
        #[arg(short, long)]
        input: PathBuf,
        /// Output CSV, rewritten after every subject
        #[arg(short, long, default_value = "email_list.csv")]
        output: PathBuf,
        /// Proxy rotation file (host:port:username:password per line)
        #[arg(long)]
        proxies: Option<PathBuf>,
        /// Never merge into an existing output file; pick a fresh
        /// numbered name next to it instead
        #[arg(long)]
        fresh: bool,
        /// Maximum fetch attempts per query
        #[arg(long, default_value_t = 5)]
        retry_limit: usize,
        /// Base backoff delay between fetch attempts
        #[arg(long = "retry-base-ms", default_value_t = 500)]
        retry_base_ms: u64,
        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print the emails found in a local HTML or text file
    Extract {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            proxies,
            fresh,
            retry_limit,
            retry_base_ms,
            quiet,
        } => scrape::run_scrape(&scrape::RunConfig {
            input,
            output,
            proxies,
            fresh,
            retry_limit,
            retry_base_ms,
            quiet,
        }),
        Commands::Extract { file } => extract::run_extract(&file),
    };

    if let Err(ref err) = result {
        tracing::error!("Run aborted: {:#}", err);
    }
    result
}
