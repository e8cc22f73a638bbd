use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cumulus")]
#[command(about = "Bulk uploads into an object store, segmenting oversized files")]
#[command(after_help = "Run '<command> --help' for detailed options on each command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a directory tree as a background job
    Upload(UploadArgs),
    /// Upload a single file
    Put(PutArgs),
}

#[derive(Args, Clone, Debug)]
pub struct UploadArgs {
    /// Directory tree to upload
    pub source: PathBuf,
    /// Base directory of the target store
    pub store: PathBuf,
    /// Container to upload into (created if absent)
    #[arg(long)]
    pub container: Option<String>,
    /// Exclude base names matching this glob (repeatable)
    #[arg(long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,
    /// Per-object size ceiling in bytes; larger files are segmented
    #[arg(long, value_name = "BYTES")]
    pub segment_size: Option<u64>,
    /// Show an interactive progress bar
    #[arg(long, short = 'p')]
    pub progress: bool,
}

#[derive(Args, Clone, Debug)]
pub struct PutArgs {
    /// File to upload
    pub file: PathBuf,
    /// Base directory of the target store
    pub store: PathBuf,
    /// Container to upload into
    #[arg(long)]
    pub container: Option<String>,
    /// Remote object name (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,
    /// Content type recorded with the object
    #[arg(long)]
    pub content_type: Option<String>,
    /// Per-object size ceiling in bytes; larger files are segmented
    #[arg(long, value_name = "BYTES")]
    pub segment_size: Option<u64>,
}
