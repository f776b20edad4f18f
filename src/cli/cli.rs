use std::path::PathBuf;

use clap::Parser;

use crate::application::data::LogLevel;

/// Keeps a replica directory identical to a source directory.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    /// Directory to mirror from
    pub source: Option<PathBuf>,

    /// Directory kept identical to the source; created if missing
    pub replica: Option<PathBuf>,

    /// File that every synchronization event is appended to
    #[clap(long)]
    pub log_file: Option<PathBuf>,

    /// Seconds between the starts of two cycles
    #[clap(long, short, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// YAML config file (defaults to ./mirrorsync.yaml when present)
    #[clap(long, short)]
    pub config: Option<PathBuf>,

    /// Compare file contents instead of size and modification time
    #[clap(long)]
    pub checksum: bool,

    /// Run a single cycle and exit
    #[clap(long)]
    pub once: bool,

    #[clap(long, short, default_value = "info", value_enum)]
    pub log_level: LogLevel,
}
