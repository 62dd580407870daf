//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Document pipeline agent
#[derive(Parser)]
#[command(
    name = "docpipe",
    version = env!("CARGO_PKG_VERSION"),
    about = "Decision layer for chunked document processing pipelines",
    long_about = "Classifies file-change events, splits large markdown into chunk jobs, \
                  and recombines chunk outputs once every chunk is fresh.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .docpipe directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Process host events from stdin
    #[command(
        about = "Read event records from stdin until EOF",
        after_help = "Each line is one JSON record:\n  {\"type\": \"FileAdded\", \"path\": \"/abs/docs/report.pdf\"}"
    )]
    Serve,

    /// Watch a directory and process its changes
    #[command(about = "Watch a directory tree and feed its changes to the agent")]
    Watch {
        /// Directory to watch recursively
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Process a single event
    #[command(
        about = "Classify and process one event",
        after_help = "Examples:\n  docpipe event --type FileAdded docs/report.pdf\n  docpipe event --type FileAdded docs/report.md_chunks/chunk_003.output.md"
    )]
    Event {
        /// Event type tag
        #[arg(long = "type", value_name = "TYPE", default_value = "FileAdded")]
        kind: String,

        /// Path the event refers to
        path: PathBuf,
    },

    /// Evaluate a job directory
    #[command(about = "Check a chunk job directory and combine it when ready")]
    Combine {
        /// Job directory (`<name>.md_chunks`)
        #[arg(value_name = "JOB_DIR")]
        job_dir: PathBuf,
    },
}
