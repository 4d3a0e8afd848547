pub mod cli;
pub mod core;
pub mod export;
pub mod providers;
pub mod server;

use crate::cli::download::DownloadOptions;
use crate::core::config::AppConfig;
use crate::core::price::DailyPriceProvider;
use crate::providers::yahoo_finance::YahooFinanceProvider;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Serve,
    Generate { output: Option<PathBuf> },
    Download(DownloadOptions),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("etfseries starting...");

    let config = AppConfig::load(config_path)?;
    debug!("Loaded config: {config:#?}");

    let provider: Arc<dyn DailyPriceProvider> =
        Arc::new(YahooFinanceProvider::new(config.yahoo_base_url()));

    match command {
        AppCommand::Serve => cli::serve::run(provider, &config).await,
        AppCommand::Generate { output } => {
            cli::generate::run(provider.as_ref(), &config, output).await
        }
        AppCommand::Download(options) => {
            let stdin = std::io::stdin();
            cli::download::run(
                provider.as_ref(),
                &config.download,
                options,
                &mut stdin.lock(),
                &mut std::io::stdout(),
            )
            .await
        }
    }
}
