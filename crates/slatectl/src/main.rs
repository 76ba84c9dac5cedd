//! slatectl - firmware install and rollback for reMarkable tablets.

use anyhow::Result;
use clap::Parser;
use slate_common::DeviceGeneration;
use slatectl::cli::{Cli, Commands};
use slatectl::commands;
use tracing::Level;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::ERROR
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let device = if cli.gen1 {
        DeviceGeneration::Gen1
    } else {
        DeviceGeneration::Gen2
    };

    match cli.command {
        Commands::Install {
            version,
            serve_folder,
        } => commands::install(version, serve_folder, device, cli.auth).await,
        Commands::Restore => commands::restore(cli.auth).await,
        Commands::Status => commands::status(cli.auth).await,
        Commands::Download { version, out } => commands::download(version, out, device).await,
        Commands::List => commands::list(),
    }
}
