//! iprange-analyser - dense IPv4 range discovery for blacklists
//!
//! Reads an address list, finds the CIDR ranges it densely fills and writes
//! a blacklist made of those ranges plus the remaining single addresses.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use iprange_analyser::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // Logs go to stderr, stdout may carry the blacklist
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Analyse(args) => {
            iprange_analyser::commands::analyse::run(args, &cli.config, cli.quiet).await
        }
        Commands::Version => {
            println!("iprange-analyser {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
