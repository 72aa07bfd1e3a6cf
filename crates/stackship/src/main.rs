mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stackship_core::config::{Credentials, WorkshopConfig};

#[derive(Parser)]
#[command(name = "ship")]
#[command(about = "Spin up, watch, and tear down a demo CI/CD pipeline on LocalStack", long_about = None)]
struct Cli {
    /// Emulator edge endpoint
    #[arg(long, global = true, default_value = stackship_aws::cli::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Workshop configuration file
    #[arg(
        short = 'c',
        long,
        global = true,
        default_value = stackship_core::config::DEFAULT_CONFIG_FILE
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the emulator and provision the whole pipeline
    Setup {
        /// Skip the emulator container startup (it must already be running)
        #[arg(long)]
        no_emulator: bool,
    },
    /// Watch the latest pipeline execution until it finishes
    Monitor {
        /// Print a single snapshot and exit
        #[arg(long)]
        once: bool,
        /// Seconds between polls
        #[arg(short, long, default_value = "5")]
        interval: u64,
    },
    /// List packages published to the workshop repository
    Packages {
        /// Package format to list versions for
        #[arg(long, default_value = "npm")]
        format: String,
    },
    /// Delete every workshop resource and stop the emulator
    Cleanup {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
        /// Leave the emulator container running
        #[arg(short = 'k', long)]
        keep_emulator: bool,
    },
    /// Verify the local environment is ready for the workshop
    Check,
    /// Show emulator container logs
    Logs {
        /// Follow the log stream
        #[arg(short, long)]
        follow: bool,
        /// Number of trailing lines to show
        #[arg(short = 'n', long, default_value = "100")]
        tail: usize,
    },
    /// Serve the demo page for the published package
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
        /// Do not open the browser
        #[arg(long)]
        no_open: bool,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    // Every external call is independently atomic, so an interrupt can
    // exit immediately without leaving multi-call state to unwind.
    tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            use colored::Colorize;
            println!();
            println!("{}", "Interrupted.".yellow());
            std::process::exit(130);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Version) {
        println!("stackship {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Logs and serve never touch the configuration or the AWS CLI.
    match &cli.command {
        Commands::Logs { follow, tail } => {
            return commands::logs::handle(*follow, *tail).await;
        }
        Commands::Serve { port, no_open } => {
            return commands::serve::handle(*port, *no_open).await;
        }
        _ => {}
    }

    let (config, source) = WorkshopConfig::load_or_init(&cli.config)?;
    utils::print_config_source(&cli.config, source);

    // The environment is read exactly once; everything downstream takes
    // the tokens by parameter.
    let credentials = Credentials::from_env();

    match cli.command {
        Commands::Setup { no_emulator } => {
            commands::setup::handle(&config, &credentials, &cli.endpoint, no_emulator).await?;
        }
        Commands::Monitor { once, interval } => {
            commands::monitor::handle(&config, &cli.endpoint, once, interval).await?;
        }
        Commands::Packages { format } => {
            commands::packages::handle(&config, &cli.endpoint, &format).await?;
        }
        Commands::Cleanup {
            force,
            keep_emulator,
        } => {
            commands::cleanup::handle(&config, &cli.config, &cli.endpoint, force, keep_emulator)
                .await?;
        }
        Commands::Check => {
            let ready =
                commands::check::handle(&config, &credentials, &cli.endpoint).await?;
            if !ready {
                std::process::exit(1);
            }
        }
        Commands::Logs { .. } | Commands::Serve { .. } | Commands::Version => {
            unreachable!("handled before config loading");
        }
    }

    Ok(())
}
