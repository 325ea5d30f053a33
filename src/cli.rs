use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vidrelay")]
#[command(author, version, about = "Split oversized videos and relay them to a chat channel")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Relay every pending link from the links file
    Run,

    /// Upload a single local file, splitting it if it is too large
    ///
    /// A file that fits under the target size is uploaded as-is and then
    /// deleted; pass --keep-source to leave it in place. A split file is
    /// kept and only its uploaded segments are deleted.
    Send {
        /// File to upload
        #[arg(required = true)]
        file: PathBuf,

        /// Do not delete FILE after it is uploaded unsplit
        #[arg(long)]
        keep_source: bool,

        /// Text posted before the upload
        #[arg(long)]
        caption: Option<String>,

        /// JPEG thumbnail attached to every uploaded item
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },

    /// Split a file into segments without uploading
    Split {
        /// File to split
        #[arg(required = true)]
        file: PathBuf,

        /// Print the planned ranges without cutting
        #[arg(long)]
        dry_run: bool,

        /// Directory for the segment folder (default: split.work_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
