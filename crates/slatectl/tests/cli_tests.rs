//! CLI parsing tests.

use clap::Parser;
use slatectl::cli::{Cli, Commands};
use std::path::PathBuf;

#[test]
fn install_takes_version_and_serve_folder() {
    let cli = Cli::try_parse_from([
        "slatectl",
        "install",
        "latest",
        "--serve-folder",
        "/tmp/stage",
    ])
    .unwrap();

    match cli.command {
        Commands::Install {
            version,
            serve_folder,
        } => {
            assert_eq!(version, "latest");
            assert_eq!(serve_folder, Some(PathBuf::from("/tmp/stage")));
        }
        _ => panic!("expected install"),
    }
    assert!(!cli.gen1);
}

#[test]
fn install_requires_a_version() {
    assert!(Cli::try_parse_from(["slatectl", "install"]).is_err());
}

#[test]
fn global_flags_apply_to_subcommands() {
    let cli = Cli::try_parse_from(["slatectl", "restore", "--gen1", "--verbose", "--auth", "pw"])
        .unwrap();
    assert!(cli.gen1);
    assert!(cli.verbose);
    assert_eq!(cli.auth.as_deref(), Some("pw"));
    assert!(matches!(cli.command, Commands::Restore));
}

#[test]
fn download_defaults_out_to_none() {
    let cli = Cli::try_parse_from(["slatectl", "download", "toltec"]).unwrap();
    match cli.command {
        Commands::Download { version, out } => {
            assert_eq!(version, "toltec");
            assert!(out.is_none());
        }
        _ => panic!("expected download"),
    }
}

#[test]
fn status_and_list_take_no_arguments() {
    assert!(matches!(
        Cli::try_parse_from(["slatectl", "status"]).unwrap().command,
        Commands::Status
    ));
    assert!(matches!(
        Cli::try_parse_from(["slatectl", "list"]).unwrap().command,
        Commands::List
    ));
}
