//! Command-line argument parsing
//!
//! Supports:
//! - `demo`: build a sample arrangement, save it and restore it
//! - `inspect`: print the structure of a saved layout

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dockyard::BackendKind;

/// Dockable panel layouts with binary persistence
#[derive(Parser, Debug)]
#[command(name = "dockyard", version, about = "Dockable panel layout engine")]
pub struct CliArgs {
    /// Also write debug logs to the logs directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a sample arrangement, save it and restore it into a fresh registry
    Demo {
        /// Backend to drive (defaults to the configured one)
        #[arg(long, value_parser = parse_backend)]
        backend: Option<BackendKind>,

        /// Write the layout to this file instead of the settings store
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Decode a saved layout and print its structure
    Inspect {
        /// Layout file; reads the configured settings store when omitted
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },
}

fn parse_backend(value: &str) -> Result<BackendKind, String> {
    match value {
        "widgets" => Ok(BackendKind::Widgets),
        "quick" => Ok(BackendKind::Quick),
        other => Err(format!("unknown backend '{other}' (expected widgets or quick)")),
    }
}
