use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use kurlar::core::log::init_logging;
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

impl From<Commands> for kurlar::AppCommand {
    fn from(cmd: Commands) -> kurlar::AppCommand {
        match cmd {
            Commands::Rates { refresh, base } => kurlar::AppCommand::Rates { refresh, base },
            Commands::Convert { from, to, amount } => {
                kurlar::AppCommand::Convert { from, to, amount }
            }
            Commands::Serve => kurlar::AppCommand::Serve,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the current exchange rates
    Rates {
        /// Bypass the cache and query every source
        #[arg(long)]
        refresh: bool,

        /// Express rates against this currency instead of the domestic one
        #[arg(long)]
        base: Option<String>,
    },
    /// Convert an amount between two currencies
    Convert {
        from: String,
        to: String,
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },
    /// Run the HTTP rate service
    Serve,
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
        Some(Commands::Setup) => kurlar::cli::setup::setup(),
        Some(cmd) => kurlar::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
