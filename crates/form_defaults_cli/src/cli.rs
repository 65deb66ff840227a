// src/cli.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "form-defaults",
    version,
    about = "Apply form schema defaults to form data"
)]
pub struct Cli {
    /// Engine configuration file (toml, json, json5 or yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the debug events of the reconciliation loop
    #[arg(long, global = true)]
    pub debug: bool,

    /// Identity tag attached to debug events
    #[arg(long, global = true)]
    pub loop_tag: Option<String>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// List the fields whose defaults the engine manages, in application order
    Scan {
        #[arg(long)]
        schema: PathBuf,
    },
    /// Reconcile form data once and print the result
    Apply {
        #[arg(long)]
        schema: PathBuf,
        /// Form data (defaults to an empty object)
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long, default_value = "edit")]
        mode: String,
        /// Write the result here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replay user edits: the first line is the initial data, every further
    /// line is merged into the current data before reconciling
    Replay {
        #[arg(long)]
        schema: PathBuf,
        /// One JSON object per line
        #[arg(long)]
        edits: PathBuf,
        #[arg(long, default_value = "edit")]
        mode: String,
    },
}
