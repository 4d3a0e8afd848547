use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use etfseries::cli::download::DownloadOptions;
use etfseries::core::log::init_logging;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve the aligned price history over HTTP
    Serve,
    /// Write the aligned price history to a static JSON file
    Generate {
        /// Output file, defaults to `export.output_path` from the config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Download daily closes for one or more tickers into a CSV file
    Download {
        /// Ticker symbols; prompted for when omitted
        tickers: Vec<String>,

        /// First trading date to fetch (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<NaiveDate>,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl From<Commands> for etfseries::AppCommand {
    fn from(cmd: Commands) -> etfseries::AppCommand {
        match cmd {
            Commands::Serve => etfseries::AppCommand::Serve,
            Commands::Generate { output } => etfseries::AppCommand::Generate { output },
            Commands::Download {
                tickers,
                start,
                output,
            } => etfseries::AppCommand::Download(DownloadOptions {
                tickers,
                start,
                output,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Some(Commands::Serve) => LevelFilter::INFO,
        _ => LevelFilter::OFF,
    };
    init_logging(cli.verbose, default_level);

    let result = match cli.command {
        Some(Commands::Setup) => etfseries::cli::setup::setup(),
        Some(cmd) => etfseries::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
