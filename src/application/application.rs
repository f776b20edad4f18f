use std::env;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::{RuntimeConfig, RuntimeConfigError};
use crate::cli::Cli;
use crate::config::{MirrorConfig, MirrorConfigError};
use crate::scheduler::{Scheduler, SchedulerCreationError, SchedulerError};

pub struct Application;

impl Application {
    /// Resolves the settings for this run from the command line and the
    /// optional config file.
    pub async fn configure(cli: Cli) -> Result<RuntimeConfig, ApplicationError> {
        let current_dir = env::current_dir().context(CurrentDirSnafu)?;
        let file_config = MirrorConfig::discover(cli.config.as_deref(), &current_dir)
            .await
            .context(ConfigSnafu)?;
        debug!("Loaded config file: {:?}", file_config);

        RuntimeConfig::resolve(cli, file_config).context(RuntimeConfigSnafu)
    }

    /// Opens the event log for appending, creating it when missing.
    pub fn open_log_file(path: &Path) -> Result<File, ApplicationError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(LogFileSnafu { path })
    }

    pub async fn run(runtime_config: RuntimeConfig) -> Result<(), ApplicationError> {
        debug!("Runtime config: {:?}", runtime_config);
        let arc_runtime_config = Arc::new(runtime_config);

        let cycles = Scheduler::new(arc_runtime_config)
            .context(SchedulerCreationSnafu)?
            .run()
            .await
            .context(SchedulerRunSnafu)?;
        info!("Mirror stopped after {cycles} cycles");

        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Failed to obtain current dir"))]
    CurrentDirError { source: std::io::Error },
    #[snafu(display("Critical failure encountered during configuration stage"))]
    ConfigError { source: MirrorConfigError },
    #[snafu(display("Incomplete configuration"))]
    RuntimeConfigError { source: RuntimeConfigError },
    #[snafu(display("Failed to open log file {}", path.display()))]
    LogFileError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Critical failure encountered during scheduler creation"))]
    SchedulerCreationError { source: SchedulerCreationError },
    #[snafu(display("Critical failure encountered while mirroring"))]
    SchedulerRunError { source: SchedulerError },
}
