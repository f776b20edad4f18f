use std::path::PathBuf;
use std::time::Duration;

use snafu::prelude::*;

use crate::cli::Cli;
use crate::config::MirrorConfig;
use crate::reconciler::Comparison;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Fully resolved settings for one run of the mirror.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub source: PathBuf,
    pub replica: PathBuf,
    pub log_file: Option<PathBuf>,
    pub interval: Duration,
    pub comparison: Comparison,
    pub once: bool,
}

impl RuntimeConfig {
    /// Merges command line arguments over the config file, falling back to
    /// defaults for anything neither sets.
    pub fn resolve(cli: Cli, file: Option<MirrorConfig>) -> Result<Self, RuntimeConfigError> {
        let file = file.unwrap_or_default();

        let source = cli.source.or(file.source).context(MissingSourceSnafu)?;
        let replica = cli.replica.or(file.replica).context(MissingReplicaSnafu)?;
        let interval = cli
            .interval
            .map(Duration::from_secs)
            .or(file.interval)
            .unwrap_or(DEFAULT_INTERVAL);
        let comparison = if cli.checksum || file.checksum.unwrap_or(false) {
            Comparison::Checksum
        } else {
            Comparison::Metadata
        };

        Ok(Self {
            source,
            replica,
            log_file: cli.log_file.or(file.log_file),
            interval,
            comparison,
            once: cli.once,
        })
    }
}

#[derive(Debug, Snafu)]
pub enum RuntimeConfigError {
    #[snafu(display("No source directory given on the command line or in the config file"))]
    MissingSource,
    #[snafu(display("No replica directory given on the command line or in the config file"))]
    MissingReplica,
}
