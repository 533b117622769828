use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    name = "memorize",
    version,
    about = "Generate flashcards from text and study them"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Base URL of the flashcard server
    #[clap(long, value_parser)]
    pub server_url: Option<String>,

    /// Directory holding the local deck cache
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Work without the flashcard server
    #[clap(long)]
    pub offline: bool,

    /// Keep everything in memory; nothing is written to the data directory
    #[clap(long)]
    pub ephemeral: bool,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the memorize application
    #[clap(subcommand)]
    pub command: Commands,
}
