//! `nfe` - extract NF-e XML documents into a tabular dataset.
//!
//! `process` parses one document, `batch` aggregates a directory and can
//! filter, summarize and export the result, `config` manages the JSON
//! configuration file. Logs go to stderr so stdout stays usable for JSON.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::{batch, config, process};

/// NF-e extractor - Turn folders of Brazilian electronic invoices into one dataset
#[derive(Parser)]
#[command(name = "nfe")]
#[command(author, version, about)]
#[command(
    long_about = "Reads NF-e XML documents (namespaced or not), extracts header, party and \
                  totals fields, and reports documents that could not be read without \
                  stopping the batch. Results can be filtered, summarized and exported to \
                  CSV or a SpreadsheetML workbook."
)]
struct Cli {
    /// Log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the JSON config file (default: <config dir>/nfe/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the fields of a single NF-e document
    Process(process::ProcessArgs),

    /// Process every NF-e document in a directory
    Batch(batch::BatchArgs),

    /// Show or edit the configuration file
    Config(config::ConfigArgs),
}

fn log_filter(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(cli.verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
