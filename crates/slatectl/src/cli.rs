//! Argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slatectl")]
#[command(about = "Install, roll back and inspect reMarkable tablet firmware", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Print debug info
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Target a first-generation tablet (default: second generation)
    #[arg(long, global = true)]
    pub gen1: bool,

    /// SSH password, or path to a private key, for the device
    #[arg(long, global = true)]
    pub auth: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the given version (downloads it when not already staged)
    Install {
        /// Version to install: an explicit id, "latest" or "toltec"
        version: String,

        /// Folder whose updates/ directory holds (or will hold) the payload
        #[arg(long = "serve-folder", short = 's')]
        serve_folder: Option<PathBuf>,
    },

    /// Swap the device back to its previous root partition
    Restore,

    /// Show the firmware version currently on the device
    Status,

    /// Download the given version firmware payload
    Download {
        /// Version to download
        version: String,

        /// Folder to download to
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List all versions this tool knows about
    List,
}
