//! CLI module for Pitchlens
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `analyze` - Upload videos and watch their analysis streams
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Analyze two clips against a remote service, keeping the last frame
//! pitchlens analyze --base-url https://analysis.example.com a.mp4 b.mp4 --frame-out last.png
//!
//! # Generate shell completions
//! pitchlens completions bash > ~/.bash_completion.d/pitchlens
//! ```

pub mod analyze;
pub mod completions;
pub mod config;
pub mod output;

pub use analyze::run_analyze;
pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::config::PlacementPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pitchlens - live pitching analysis viewer
#[derive(Parser, Debug)]
#[command(
    name = "pitchlens",
    version,
    about = "Stream pitching-analysis frames and biomechanical metrics for uploaded videos"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload videos and follow their analysis
    Analyze(AnalyzeArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Video files to analyze, one session each, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, default_value = "pitchlens.toml")]
    pub config: PathBuf,

    /// Override analysis service base URL
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Frame placement policy (letterbox, resize_to_frame)
    #[arg(short, long)]
    pub placement: Option<PlacementPolicy>,

    /// Write the render surface to this image file after each presented frame
    #[arg(long)]
    pub frame_out: Option<PathBuf>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Print the session summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "pitchlens.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
