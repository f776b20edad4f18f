use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use compio::dispatcher::{Dispatcher, DispatcherBuilder};
use compio::signal::ctrl_c;
use compio::time::sleep;
use futures::future::{Either, select};
use futures_channel::oneshot;
use snafu::{Report, ResultExt, Snafu};
use tracing::{debug, error, info};

use crate::application::RuntimeConfig;
use crate::reconciler::{CycleSummary, Reconciler};
use crate::scheduler::{Cycle, CycleError};

/// Cycles run strictly one after another, so one worker is enough.
const CYCLE_WORKER_THREADS: NonZeroUsize = NonZeroUsize::MIN;

type CycleReceiver = oneshot::Receiver<Result<CycleSummary, CycleError>>;

pub struct Scheduler {
    dispatcher: Dispatcher,
    cycle: Arc<Cycle>,
    cancel: Arc<AtomicBool>,
    interval: Duration,
    once: bool,
}

impl Scheduler {
    /// Creates a scheduler whose cycles run on a dedicated worker thread,
    /// leaving the main runtime free to react to Ctrl-C.
    pub fn new(runtime_config: Arc<RuntimeConfig>) -> Result<Self, SchedulerCreationError> {
        let dispatcher = DispatcherBuilder::new()
            .worker_threads(CYCLE_WORKER_THREADS)
            .build()
            .context(DispatcherSnafu)?;

        let cancel = Arc::new(AtomicBool::new(false));
        let reconciler = Reconciler::new()
            .with_comparison(runtime_config.comparison)
            .with_cancel_flag(cancel.clone());
        let cycle = Cycle::new(
            runtime_config.source.clone(),
            runtime_config.replica.clone(),
            reconciler,
        );

        Ok(Self {
            dispatcher,
            cycle: Arc::new(cycle),
            cancel,
            interval: runtime_config.interval,
            once: runtime_config.once,
        })
    }

    /// Runs cycles on a fixed period until Ctrl-C, or once in one-shot mode.
    /// Returns the number of cycles started.
    pub async fn run(&self) -> Result<u64, SchedulerError> {
        info!(
            "Mirroring {} into {} every {}s",
            self.cycle.source().display(),
            self.cycle.replica().display(),
            self.interval.as_secs()
        );
        let mut shutdown = Box::pin(ctrl_c());
        let mut cycles = 0;

        loop {
            let started = Instant::now();
            cycles += 1;
            debug!("Starting cycle {cycles}");
            let receiver = self.dispatch_cycle()?;

            match select(receiver, &mut shutdown).await {
                Either::Left((result, _)) => Self::report(cycles, result),
                Either::Right((signal, receiver)) => {
                    Self::log_signal(signal);
                    info!("Shutdown requested, stopping after the current operation");
                    self.cancel.store(true, Ordering::SeqCst);
                    Self::report(cycles, receiver.await);
                    return Ok(cycles);
                }
            }

            if self.once {
                return Ok(cycles);
            }

            let wait = self.interval.saturating_sub(started.elapsed());
            debug!("Next cycle in {}ms", wait.as_millis());
            if let Either::Right((signal, _)) = select(Box::pin(sleep(wait)), &mut shutdown).await {
                Self::log_signal(signal);
                info!("Shutdown requested, exiting");
                return Ok(cycles);
            }
        }
    }

    fn dispatch_cycle(&self) -> Result<CycleReceiver, SchedulerError> {
        let cycle = self.cycle.clone();
        self.dispatcher
            .dispatch(move || async move { cycle.run() })
            .map_err(|e| {
                CycleDispatchSnafu {
                    error: e.to_string(),
                }
                .build()
            })
    }

    fn report(
        cycle: u64,
        result: Result<Result<CycleSummary, CycleError>, oneshot::Canceled>,
    ) {
        match result {
            Ok(Ok(summary)) => debug!("Cycle {cycle} completed: {summary}"),
            Ok(Err(err)) => error!(
                "Cycle {cycle} aborted, retrying at the next interval: {}",
                Report::from_error(err)
            ),
            Err(_) => error!("Cycle {cycle} was dropped before completing"),
        }
    }

    fn log_signal(signal: std::io::Result<()>) {
        if let Err(err) = signal {
            error!("Failed to listen for Ctrl-C: {err}");
        }
    }
}

#[derive(Debug, Snafu)]
pub enum SchedulerCreationError {
    #[snafu(display("Failed to create cycle dispatcher"))]
    DispatcherError { source: std::io::Error },
}

#[derive(Debug, Snafu)]
pub enum SchedulerError {
    #[snafu(display("Failed to dispatch cycle: {}", error))]
    CycleDispatchError { error: String },
}
