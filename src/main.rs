use std::path::Path;
use std::sync::Mutex;

use clap::Parser as _;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

use mirrorsync::application::{Application, ApplicationError};
use mirrorsync::cli::Cli;

#[compio::main]
#[snafu::report]
async fn main() -> Result<(), ApplicationError> {
    let cli_args = Cli::parse();
    let console_filter = cli_args.log_level.console_filter();
    let runtime_config = Application::configure(cli_args).await?;
    setup_tracing(console_filter, runtime_config.log_file.as_deref())?;
    debug!("Resolved configuration: {runtime_config:?}");

    Application::run(runtime_config).await?;

    Ok(())
}

/// Console output follows the requested level; the log file, when set,
/// receives every event at `info` and above without colours.
fn setup_tracing(
    console_filter: LevelFilter,
    log_file: Option<&Path>,
) -> Result<(), ApplicationError> {
    let file_layer = match log_file {
        Some(path) => {
            let file = Application::open_log_file(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::INFO),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();
    Ok(())
}
