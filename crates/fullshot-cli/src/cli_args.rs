//! CLI argument parsing for fullshot.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
#[command(name = "fullshot")]
#[command(about = "Full-page screenshots of documents hosted in native windows")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory relative output paths are written to (overrides config)
    #[arg(long, value_name = "DIR", global = true)]
    pub output_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Capture a native browser window by title (Windows only)
    Capture {
        /// Exact title of the top-level window
        #[arg(long)]
        title: String,

        /// Class name of the window hosting the document (overrides config)
        #[arg(long, value_name = "CLASS")]
        content_class: Option<String>,

        /// Also write the PNG to this file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run the capture pipeline against a simulated browser
    Simulate {
        /// TOML scenario describing the simulated window and document
        #[arg(long, value_name = "FILE")]
        scenario: Option<PathBuf>,

        /// Also write the PNG to this file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination (defaults to ~/.config/fullshot/config.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
