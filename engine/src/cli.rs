//! CLI interface for Essaymark
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for running the server and
//! inspecting its data.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Essaymark essay marking server
///
/// Serves account registration, essay submission with generated feedback,
/// and data exports over HTTP, backed by flat JSON files.
#[derive(Parser, Debug)]
#[command(name = "essaymark")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server until interrupted
    Serve {
        /// Override the configured listen host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured listen port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write a data dump to stdout or a file
    Export {
        /// Which dump to produce
        #[arg(value_enum)]
        kind: ExportKind,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Run system diagnostics
    Doctor,
}

/// Export formats, matching the HTTP export endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    /// Accounts as a JSON array
    AccountsJson,
    /// Accounts as a plain-text listing
    AccountsText,
    /// Essay submissions as a JSON array
    EssaysJson,
}

impl ExportKind {
    /// Download name used by the matching HTTP endpoint
    pub fn file_name(self) -> &'static str {
        match self {
            ExportKind::AccountsJson => "users_data.json",
            ExportKind::AccountsText => "users_data.txt",
            ExportKind::EssaysJson => "essays_data.json",
        }
    }
}
