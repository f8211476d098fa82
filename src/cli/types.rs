//! CLI type definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gcservant")]
#[command(about = "gcservant - Telegram bot for happiness-mj.xyz", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (replaces gcservant.yaml and gcservant.local.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the polling loop and the event drain until Ctrl-C
    Run,

    /// Publish the public command list and exit
    RegisterCommands,

    /// Apply database migrations and exit
    Migrate,

    /// Validate configuration and print it with secrets masked
    CheckConfig,
}
