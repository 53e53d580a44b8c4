pub mod aggregator;
pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

use crate::aggregator::RateAggregator;
use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Rates {
        refresh: bool,
        base: Option<String>,
    },
    Convert {
        from: String,
        to: String,
        amount: f64,
    },
    Serve,
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("kurlar starting...");
    let config = load_config(config_path)?;

    match command {
        AppCommand::Rates { refresh, base } => {
            let aggregator = RateAggregator::from_config(&config);
            cli::rates::run(&aggregator, refresh, base.as_deref()).await
        }
        AppCommand::Convert { from, to, amount } => {
            let aggregator = RateAggregator::from_config(&config);
            cli::convert::run(&aggregator, &from, &to, amount).await
        }
        AppCommand::Serve => server::serve(&config).await,
    }
}
